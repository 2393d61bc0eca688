//! Graph variables
//!
//! Variables are named, typed slots shared by every pulse running over a
//! graph. Reads and writes are individually atomic and immediately visible to
//! other pulses; read-modify-write sequences are not protected.

use parking_lot::RwLock;

use crate::error::{EngineError, Result};
use crate::types::{DataType, Value, VariableId};

/// A named, typed graph variable
#[derive(Debug, Clone, PartialEq)]
pub struct GraphVariable {
    pub id: VariableId,
    pub name: String,
    pub data_type: DataType,
    /// Whether the value survives save/load
    pub persistent: bool,
    pub value: Value,
}

impl GraphVariable {
    /// A variable holding its type default
    pub fn new(id: VariableId, name: impl Into<String>, data_type: DataType, persistent: bool) -> Self {
        let value = data_type.default_value();
        Self {
            id,
            name: name.into(),
            data_type,
            persistent,
            value,
        }
    }
}

/// Interior-mutable variable table
#[derive(Debug, Default)]
pub struct VariableStore {
    variables: RwLock<Vec<GraphVariable>>,
}

impl Clone for VariableStore {
    fn clone(&self) -> Self {
        Self {
            variables: RwLock::new(self.variables.read().clone()),
        }
    }
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every variable, in declaration order
    pub fn all(&self) -> Vec<GraphVariable> {
        self.variables.read().clone()
    }

    pub fn len(&self) -> usize {
        self.variables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.read().is_empty()
    }

    /// Snapshot of one variable by id
    pub fn get(&self, id: VariableId) -> Option<GraphVariable> {
        self.variables.read().iter().find(|v| v.id == id).cloned()
    }

    /// Snapshot of one variable by name
    pub fn by_name(&self, name: &str) -> Option<GraphVariable> {
        self.variables.read().iter().find(|v| v.name == name).cloned()
    }

    /// Current value of a variable by name
    pub fn value(&self, name: &str) -> Result<Value> {
        self.variables
            .read()
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.clone())
            .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))
    }

    /// Write a variable by name, coercing to its declared type
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        let mut variables = self.variables.write();
        let variable = variables
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))?;
        variable.value = value.convert(&variable.data_type)?;
        Ok(())
    }

    /// Write a variable by id, coercing to its declared type
    pub fn set_by_id(&self, id: VariableId, value: Value) -> Result<()> {
        let mut variables = self.variables.write();
        let variable = variables
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| EngineError::UnknownVariable(id.to_string()))?;
        variable.value = value.convert(&variable.data_type)?;
        Ok(())
    }

    pub(crate) fn insert(&mut self, variable: GraphVariable) -> Result<()> {
        let variables = self.variables.get_mut();
        if variables.iter().any(|v| v.name == variable.name) {
            return Err(EngineError::DuplicateVariable(variable.name));
        }
        if variables.iter().any(|v| v.id == variable.id) {
            return Err(EngineError::DuplicateVariable(variable.id.to_string()));
        }
        variables.push(variable);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: VariableId) -> Option<GraphVariable> {
        let variables = self.variables.get_mut();
        let index = variables.iter().position(|v| v.id == id)?;
        Some(variables.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VariableStore {
        let mut store = VariableStore::new();
        store
            .insert(GraphVariable::new(uuid::Uuid::new_v4(), "brightness", DataType::Float, true))
            .unwrap();
        store
    }

    #[test]
    fn test_set_coerces_to_declared_type() {
        let store = store();
        store.set("brightness", Value::Int(3)).unwrap();
        assert_eq!(store.value("brightness").unwrap(), Value::Float(3.0));

        let err = store.set("brightness", Value::from("bright")).unwrap_err();
        assert!(matches!(err, EngineError::TypeMismatch { .. }));
    }

    #[test]
    fn test_unknown_and_duplicate() {
        let mut store = store();
        assert!(matches!(
            store.value("missing"),
            Err(EngineError::UnknownVariable(_))
        ));
        let dup = GraphVariable::new(uuid::Uuid::new_v4(), "brightness", DataType::Int, false);
        assert!(matches!(
            store.insert(dup),
            Err(EngineError::DuplicateVariable(_))
        ));
    }

    #[test]
    fn test_clone_is_independent() {
        let store = store();
        let copy = store.clone();
        store.set("brightness", Value::Float(0.5)).unwrap();
        assert_eq!(copy.value("brightness").unwrap(), Value::Float(0.0));
    }
}
