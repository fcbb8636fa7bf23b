//! The object heap: a monotonically growing map from object id to record.
//!
//! There is no reclamation — objects live for the remainder of the run, as
//! spec'd. Field order within a record is insertion order (`IndexMap`), so
//! `new T` initializes fields in the record type's declared order.

use indexmap::IndexMap;

use crate::error::MplError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub usize);

#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn get_field(&self, name: &str) -> Result<&Value, MplError> {
        self.fields
            .get(name)
            .ok_or_else(|| MplError::runtime_global(format!("attribute '{name}' not found")))
    }

    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), MplError> {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(MplError::runtime_global(format!("attribute '{name}' not found"))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Heap {
    objects: Vec<Record>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(Record::new());
        id
    }

    pub fn set_object(&mut self, id: ObjectId, record: Record) {
        self.objects[id.0] = record;
    }

    pub fn get_object(&self, id: ObjectId) -> Result<&Record, MplError> {
        self.objects
            .get(id.0)
            .ok_or_else(|| MplError::runtime_global(format!("object #{} does not exist", id.0)))
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Record, MplError> {
        self.objects
            .get_mut(id.0)
            .ok_or_else(|| MplError::runtime_global(format!("object #{} does not exist", id.0)))
    }

    pub fn has_object(&self, id: ObjectId) -> bool {
        id.0 < self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_monotonic() {
        let mut heap = Heap::new();
        let a = heap.allocate();
        let b = heap.allocate();
        assert_eq!(a.0, 0);
        assert_eq!(b.0, 1);
    }

    #[test]
    fn fields_preserve_insertion_order() {
        let mut record = Record::new();
        record.insert_field("b", Value::Int(1));
        record.insert_field("a", Value::Int(2));
        let names: Vec<_> = record.fields.keys().cloned().collect();
        assert_eq!(names, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn unknown_field_access_is_a_runtime_error() {
        let record = Record::new();
        assert!(record.get_field("missing").is_err());
    }

    #[test]
    fn set_object_replaces_the_stored_record() {
        let mut heap = Heap::new();
        let id = heap.allocate();
        let mut record = Record::new();
        record.insert_field("v", Value::Int(7));
        heap.set_object(id, record);
        assert_eq!(heap.get_object(id).unwrap().get_field("v").unwrap(), &Value::Int(7));
    }
}
