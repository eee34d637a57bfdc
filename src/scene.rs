//! JSON scene serialization.
//!
//! A scene is `{bodies: [...], joints: [...]}` with shapes nested in their
//! bodies and joints referencing bodies by array index. Loading a scene and
//! immediately serializing it yields structurally equal output modulo id
//! reassignment.

use crate::bodies::{Material, RigidBody, RigidBodyType};
use crate::constraints::{
    AngleJoint, DistanceJoint, Joint, LineJoint, PrismaticJoint, RevoluteJoint, RopeJoint,
    WeldJoint,
};
use crate::core::{BodyHandle, Space};
use crate::error::PhysicsError;
use crate::math::Vec2;
use crate::shapes::{Circle, Poly, Segment, Shape, ShapeData};
use crate::Result;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const SHAPE_KINDS: [&str; 3] = ["ShapeCircle", "ShapeSegment", "ShapePoly"];
const JOINT_KINDS: [&str; 7] = [
    "RopeJoint",
    "DistanceJoint",
    "RevoluteJoint",
    "WeldJoint",
    "PrismaticJoint",
    "LineJoint",
    "AngleJoint",
];

fn default_max_force() -> f32 {
    f32::MAX
}

/// A complete scene: bodies with their shapes, and joints between them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDef {
    pub bodies: Vec<BodyDef>,

    #[serde(default)]
    pub joints: Vec<JointDef>,
}

/// One body and its shapes. `position` and the shape geometry are in the
/// body-origin frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyDef {
    #[serde(rename = "type")]
    pub body_type: RigidBodyType,

    pub position: Vec2,

    #[serde(default)]
    pub angle: f32,

    #[serde(default)]
    pub shapes: Vec<ShapeDef>,
}

/// One shape with its material (`e` restitution, `u` friction)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShapeDef {
    ShapeCircle {
        center: Vec2,
        radius: f32,
        e: f32,
        u: f32,
        density: f32,
    },
    ShapeSegment {
        a: Vec2,
        b: Vec2,
        radius: f32,
        e: f32,
        u: f32,
        density: f32,
    },
    ShapePoly {
        verts: Vec<Vec2>,
        e: f32,
        u: f32,
        density: f32,
    },
}

/// One joint; `body1`/`body2` index into the scene's body array
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JointDef {
    RopeJoint {
        body1: usize,
        body2: usize,
        anchor1: Vec2,
        anchor2: Vec2,
        max_length: f32,
        #[serde(default)]
        collide_connected: bool,
        #[serde(default = "default_max_force")]
        max_force: f32,
        #[serde(default)]
        breakable: bool,
    },
    DistanceJoint {
        body1: usize,
        body2: usize,
        anchor1: Vec2,
        anchor2: Vec2,
        rest_length: f32,
        #[serde(default)]
        frequency_hz: f32,
        #[serde(default)]
        damping_ratio: f32,
        #[serde(default)]
        collide_connected: bool,
        #[serde(default = "default_max_force")]
        max_force: f32,
        #[serde(default)]
        breakable: bool,
    },
    RevoluteJoint {
        body1: usize,
        body2: usize,
        anchor1: Vec2,
        anchor2: Vec2,
        #[serde(default)]
        ref_angle: f32,
        #[serde(default)]
        enable_motor: bool,
        #[serde(default)]
        motor_speed: f32,
        #[serde(default)]
        max_motor_torque: f32,
        #[serde(default)]
        enable_limit: bool,
        #[serde(default)]
        lower_angle: f32,
        #[serde(default)]
        upper_angle: f32,
        #[serde(default)]
        collide_connected: bool,
        #[serde(default = "default_max_force")]
        max_force: f32,
        #[serde(default)]
        breakable: bool,
    },
    WeldJoint {
        body1: usize,
        body2: usize,
        anchor1: Vec2,
        anchor2: Vec2,
        #[serde(default)]
        ref_angle: f32,
        #[serde(default)]
        collide_connected: bool,
        #[serde(default = "default_max_force")]
        max_force: f32,
        #[serde(default)]
        breakable: bool,
    },
    PrismaticJoint {
        body1: usize,
        body2: usize,
        anchor1: Vec2,
        anchor2: Vec2,
        axis: Vec2,
        #[serde(default)]
        ref_angle: f32,
        #[serde(default)]
        collide_connected: bool,
        #[serde(default = "default_max_force")]
        max_force: f32,
        #[serde(default)]
        breakable: bool,
    },
    LineJoint {
        body1: usize,
        body2: usize,
        anchor1: Vec2,
        anchor2: Vec2,
        axis: Vec2,
        #[serde(default)]
        collide_connected: bool,
        #[serde(default = "default_max_force")]
        max_force: f32,
        #[serde(default)]
        breakable: bool,
    },
    AngleJoint {
        body1: usize,
        body2: usize,
        #[serde(default)]
        ref_angle: f32,
        #[serde(default)]
        enable_limit: bool,
        #[serde(default)]
        lower_angle: f32,
        #[serde(default)]
        upper_angle: f32,
        #[serde(default)]
        collide_connected: bool,
        #[serde(default = "default_max_force")]
        max_force: f32,
        #[serde(default)]
        breakable: bool,
    },
}

impl SceneDef {
    /// Parses a scene from JSON, pre-validating shape and joint kind tags
    /// so unknown kinds are reported as such rather than as parse noise
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| PhysicsError::InvalidScene(e.to_string()))?;

        if let Some(bodies) = value.get("bodies").and_then(|b| b.as_array()) {
            for body in bodies {
                let Some(shapes) = body.get("shapes").and_then(|s| s.as_array()) else {
                    continue;
                };
                for shape in shapes {
                    check_kind(shape, &SHAPE_KINDS, PhysicsError::UnknownShapeKind)?;
                }
            }
        }
        if let Some(joints) = value.get("joints").and_then(|j| j.as_array()) {
            for joint in joints {
                check_kind(joint, &JOINT_KINDS, PhysicsError::UnknownJointKind)?;
            }
        }

        serde_json::from_value(value).map_err(|e| PhysicsError::InvalidScene(e.to_string()))
    }

    /// Serializes the scene to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PhysicsError::InvalidScene(e.to_string()))
    }
}

fn check_kind(
    value: &serde_json::Value,
    known: &[&str],
    err: fn(String) -> PhysicsError,
) -> Result<()> {
    match value.get("type").and_then(|t| t.as_str()) {
        Some(kind) if known.contains(&kind) => Ok(()),
        Some(kind) => Err(err(kind.to_string())),
        None => Err(PhysicsError::InvalidScene(
            "definition is missing its \"type\" tag".to_string(),
        )),
    }
}

impl ShapeDef {
    fn to_shape(&self) -> Shape {
        match *self {
            ShapeDef::ShapeCircle {
                center,
                radius,
                e,
                u,
                density,
            } => Shape::with_material(
                ShapeData::Circle(Circle::new(center, radius)),
                Material::new(density, u, e),
            ),
            ShapeDef::ShapeSegment {
                a,
                b,
                radius,
                e,
                u,
                density,
            } => Shape::with_material(
                ShapeData::Segment(Segment::new(a, b, radius)),
                Material::new(density, u, e),
            ),
            ShapeDef::ShapePoly {
                ref verts,
                e,
                u,
                density,
            } => Shape::with_material(
                ShapeData::Poly(Poly::new(verts.clone())),
                Material::new(density, u, e),
            ),
        }
    }

    fn from_shape(shape: &Shape) -> Self {
        let (e, u, density) = (
            shape.material.restitution,
            shape.material.friction,
            shape.material.density,
        );
        match &shape.data {
            ShapeData::Circle(c) => ShapeDef::ShapeCircle {
                center: c.center,
                radius: c.radius,
                e,
                u,
                density,
            },
            ShapeData::Segment(s) => ShapeDef::ShapeSegment {
                a: s.a,
                b: s.b,
                radius: s.radius,
                e,
                u,
                density,
            },
            ShapeData::Poly(p) => ShapeDef::ShapePoly {
                verts: p.verts.clone(),
                e,
                u,
                density,
            },
        }
    }
}

impl JointDef {
    fn body_indices(&self) -> (usize, usize) {
        match *self {
            JointDef::RopeJoint { body1, body2, .. }
            | JointDef::DistanceJoint { body1, body2, .. }
            | JointDef::RevoluteJoint { body1, body2, .. }
            | JointDef::WeldJoint { body1, body2, .. }
            | JointDef::PrismaticJoint { body1, body2, .. }
            | JointDef::LineJoint { body1, body2, .. }
            | JointDef::AngleJoint { body1, body2, .. } => (body1, body2),
        }
    }

    fn to_joint(&self, h1: BodyHandle, h2: BodyHandle) -> Box<dyn Joint> {
        let mut joint: Box<dyn Joint> = match *self {
            JointDef::RopeJoint {
                anchor1,
                anchor2,
                max_length,
                ..
            } => Box::new(RopeJoint::new(h1, h2, anchor1, anchor2, max_length)),
            JointDef::DistanceJoint {
                anchor1,
                anchor2,
                rest_length,
                frequency_hz,
                damping_ratio,
                ..
            } => {
                let mut j = DistanceJoint::new(h1, h2, anchor1, anchor2, rest_length);
                if frequency_hz > 0.0 {
                    j.set_spring(frequency_hz, damping_ratio);
                }
                Box::new(j)
            }
            JointDef::RevoluteJoint {
                anchor1,
                anchor2,
                ref_angle,
                enable_motor,
                motor_speed,
                max_motor_torque,
                enable_limit,
                lower_angle,
                upper_angle,
                ..
            } => {
                let mut j = RevoluteJoint::new(h1, h2, anchor1, anchor2);
                j.set_ref_angle(ref_angle);
                if enable_motor {
                    j.enable_motor(motor_speed, max_motor_torque);
                }
                if enable_limit {
                    j.set_limits(lower_angle, upper_angle);
                }
                Box::new(j)
            }
            JointDef::WeldJoint {
                anchor1,
                anchor2,
                ref_angle,
                ..
            } => {
                let mut j = WeldJoint::new(h1, h2, anchor1, anchor2);
                j.set_ref_angle(ref_angle);
                Box::new(j)
            }
            JointDef::PrismaticJoint {
                anchor1,
                anchor2,
                axis,
                ref_angle,
                ..
            } => {
                let mut j = PrismaticJoint::new(h1, h2, anchor1, anchor2, axis);
                j.set_ref_angle(ref_angle);
                Box::new(j)
            }
            JointDef::LineJoint {
                anchor1,
                anchor2,
                axis,
                ..
            } => Box::new(LineJoint::new(h1, h2, anchor1, anchor2, axis)),
            JointDef::AngleJoint {
                ref_angle,
                enable_limit,
                lower_angle,
                upper_angle,
                ..
            } => {
                let mut j = AngleJoint::new(h1, h2, ref_angle);
                if enable_limit {
                    j.set_limits(lower_angle, upper_angle);
                }
                Box::new(j)
            }
        };

        let (collide_connected, max_force, breakable) = match *self {
            JointDef::RopeJoint {
                collide_connected,
                max_force,
                breakable,
                ..
            }
            | JointDef::DistanceJoint {
                collide_connected,
                max_force,
                breakable,
                ..
            }
            | JointDef::RevoluteJoint {
                collide_connected,
                max_force,
                breakable,
                ..
            }
            | JointDef::WeldJoint {
                collide_connected,
                max_force,
                breakable,
                ..
            }
            | JointDef::PrismaticJoint {
                collide_connected,
                max_force,
                breakable,
                ..
            }
            | JointDef::LineJoint {
                collide_connected,
                max_force,
                breakable,
                ..
            }
            | JointDef::AngleJoint {
                collide_connected,
                max_force,
                breakable,
                ..
            } => (collide_connected, max_force, breakable),
        };
        let core = joint.joint_core_mut();
        core.collide_connected = collide_connected;
        core.max_force = max_force;
        core.breakable = breakable;

        joint
    }
}

/// Serializes a live space into a scene definition
pub fn to_scene(space: &Space) -> SceneDef {
    let mut index_of = HashMap::new();
    let mut bodies = Vec::with_capacity(space.body_count());

    for (i, (handle, body)) in space.bodies().enumerate() {
        index_of.insert(handle, i);
        bodies.push(BodyDef {
            body_type: body.body_type(),
            position: body.origin(),
            angle: body.angle(),
            shapes: body.shapes().iter().map(ShapeDef::from_shape).collect(),
        });
    }

    let joints = space
        .joints()
        .map(|(_, joint)| joint.to_def(index_of[&joint.body1()], index_of[&joint.body2()]))
        .collect();

    SceneDef { bodies, joints }
}

/// Builds bodies and joints from a scene definition into a cleared space
pub(crate) fn populate(space: &mut Space, scene: &SceneDef) -> Result<()> {
    let mut handles = Vec::with_capacity(scene.bodies.len());
    for def in &scene.bodies {
        let mut body = RigidBody::new(def.body_type, def.position, def.angle);
        for shape_def in &def.shapes {
            body.add_shape(shape_def.to_shape());
        }
        handles.push(space.add_body(body));
    }

    for def in &scene.joints {
        let (i1, i2) = def.body_indices();
        for index in [i1, i2] {
            if index >= handles.len() {
                return Err(PhysicsError::BodyIndexOutOfRange {
                    index,
                    len: handles.len(),
                });
            }
        }
        space.add_joint(def.to_joint(handles[i1], handles[i2]));
    }

    Ok(())
}
