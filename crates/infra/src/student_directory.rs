use std::collections::HashSet;
use std::sync::RwLock;

use bursar_core::StudentId;
use bursar_ledger::{CatalogError, StudentDirectory};

/// In-memory registry of known students.
#[derive(Debug, Default)]
pub struct InMemoryStudentDirectory {
    students: RwLock<HashSet<StudentId>>,
}

impl InMemoryStudentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, student: StudentId) -> Result<(), CatalogError> {
        let mut students = self
            .students
            .write()
            .map_err(|_| CatalogError::Backend("lock poisoned".to_string()))?;
        students.insert(student);
        Ok(())
    }
}

impl StudentDirectory for InMemoryStudentDirectory {
    fn is_known(&self, student: StudentId) -> Result<bool, CatalogError> {
        let students = self
            .students
            .read()
            .map_err(|_| CatalogError::Backend("lock poisoned".to_string()))?;
        Ok(students.contains(&student))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_students_are_known() {
        let directory = InMemoryStudentDirectory::new();
        let student = StudentId::new();

        assert!(!directory.is_known(student).unwrap());
        directory.register(student).unwrap();
        assert!(directory.is_known(student).unwrap());
    }
}
