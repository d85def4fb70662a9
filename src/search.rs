use crate::custom_data::{self, DATA_ID};
use crate::types::{Field, ObjectHandle};
use crate::{Result, Scene};
use std::collections::{HashSet, VecDeque};

/// Return true if an object's custom data contains `field`.
///
/// An object without a block, or with an empty one, simply lacks the field.
/// A block that fails to decode is an error.
pub fn has_field(scene: &dyn Scene, obj: ObjectHandle, field: Field) -> Result<bool> {
    let size = scene.custom_data_len(obj, DATA_ID);
    if size <= 0 {
        return Ok(false);
    }

    let buf = scene.custom_data(obj, DATA_ID, size as usize)?;
    let data = custom_data::decode(&buf)?;
    Ok(data.contains_key(&field.id()))
}

/// Search the tree under `root` (inclusive) in breadth-first order for the
/// first object carrying `field`. Returns [`ObjectHandle::NONE`] if nothing
/// matches.
pub fn find_with_field(scene: &dyn Scene, root: ObjectHandle, field: Field) -> Result<ObjectHandle> {
    let mut queue = VecDeque::from([root]);
    let mut seen = HashSet::from([root]);

    while let Some(obj) = queue.pop_front() {
        if has_field(scene, obj, field)? {
            return Ok(obj);
        }

        let mut i = 0;
        while let Some(child) = scene.child(obj, i) {
            i += 1;
            if seen.insert(child) {
                queue.push_back(child);
            }
        }
    }

    Ok(ObjectHandle::NONE)
}
