use crate::core::{BodyHandle, JointHandle};
use crate::error::PhysicsError;
use crate::Result;
use std::collections::HashMap;

/// Generic storage trait for physics objects.
///
/// `handles` and `iter` visit items in ascending id order; the stepper
/// relies on that for reproducible results.
pub trait Storage<T, H> {
    /// Creates a new empty storage
    fn new() -> Self;

    /// Adds an item to the storage and returns its handle
    fn add(&mut self, item: T) -> H;

    /// Gets a reference to an item by its handle
    fn get(&self, handle: H) -> Option<&T>;

    /// Gets a mutable reference to an item by its handle
    fn get_mut(&mut self, handle: H) -> Option<&mut T>;

    /// Removes an item from the storage
    fn remove(&mut self, handle: H) -> Option<T>;

    /// Returns the number of items in the storage
    fn len(&self) -> usize;

    /// Returns whether the storage is empty
    fn is_empty(&self) -> bool;

    /// Clears all items and resets the id counter
    fn clear(&mut self);

    /// Returns all handles in ascending id order
    fn handles(&self) -> Vec<H>;

    /// Iterates items in ascending id order
    fn iter<'a>(&'a self) -> impl Iterator<Item = (H, &'a T)> + 'a
    where
        T: 'a;

    /// Iterates items mutably, in no particular order
    fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = (H, &'a mut T)> + 'a
    where
        T: 'a;
}

macro_rules! handle_storage {
    ($name:ident, $handle:ty) => {
        pub struct $name<T> {
            items: HashMap<$handle, T>,
            next_id: u32,
        }

        impl<T> Storage<T, $handle> for $name<T> {
            fn new() -> Self {
                Self {
                    items: HashMap::new(),
                    next_id: 1, // 0 represents an invalid handle
                }
            }

            fn add(&mut self, item: T) -> $handle {
                let handle = <$handle>::from_raw(self.next_id);
                self.next_id += 1;
                self.items.insert(handle, item);
                handle
            }

            fn get(&self, handle: $handle) -> Option<&T> {
                self.items.get(&handle)
            }

            fn get_mut(&mut self, handle: $handle) -> Option<&mut T> {
                self.items.get_mut(&handle)
            }

            fn remove(&mut self, handle: $handle) -> Option<T> {
                self.items.remove(&handle)
            }

            fn len(&self) -> usize {
                self.items.len()
            }

            fn is_empty(&self) -> bool {
                self.items.is_empty()
            }

            fn clear(&mut self) {
                self.items.clear();
                self.next_id = 1;
            }

            fn handles(&self) -> Vec<$handle> {
                let mut handles: Vec<_> = self.items.keys().copied().collect();
                handles.sort();
                handles
            }

            fn iter<'a>(&'a self) -> impl Iterator<Item = ($handle, &'a T)> + 'a
            where
                T: 'a,
            {
                self.handles().into_iter().map(move |h| (h, &self.items[&h]))
            }

            fn iter_mut<'a>(&'a mut self) -> impl Iterator<Item = ($handle, &'a mut T)> + 'a
            where
                T: 'a,
            {
                self.items.iter_mut().map(|(h, item)| (*h, item))
            }
        }
    };
}

impl BodyHandle {
    fn from_raw(id: u32) -> Self {
        Self(id)
    }
}

impl JointHandle {
    fn from_raw(id: u32) -> Self {
        Self(id)
    }
}

handle_storage!(BodyStorage, BodyHandle);
handle_storage!(JointStorage, JointHandle);

impl<T> BodyStorage<T> {
    /// Gets a body by its handle, returning an error if not found
    pub fn get_body(&self, handle: BodyHandle) -> Result<&T> {
        self.get(handle).ok_or_else(|| {
            PhysicsError::ResourceNotFound(format!("body with handle {:?} not found", handle))
        })
    }

    /// Gets a mutable reference to a body by its handle, returning an error
    /// if not found
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut T> {
        self.get_mut(handle).ok_or_else(|| {
            PhysicsError::ResourceNotFound(format!("body with handle {:?} not found", handle))
        })
    }

    /// Gets disjoint mutable references to two different bodies
    pub fn get_pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> Option<(&mut T, &mut T)> {
        if a == b {
            return None;
        }
        let [first, second] = self.items.get_disjoint_mut([&a, &b]);
        Some((first?, second?))
    }
}

impl<T> JointStorage<T> {
    /// Gets a joint by its handle, returning an error if not found
    pub fn get_joint(&self, handle: JointHandle) -> Result<&T> {
        self.get(handle).ok_or_else(|| {
            PhysicsError::ResourceNotFound(format!("joint with handle {:?} not found", handle))
        })
    }

    /// Gets a mutable reference to a joint by its handle, returning an error
    /// if not found
    pub fn get_joint_mut(&mut self, handle: JointHandle) -> Result<&mut T> {
        self.get_mut(handle).ok_or_else(|| {
            PhysicsError::ResourceNotFound(format!("joint with handle {:?} not found", handle))
        })
    }
}
