//! Role-based access to hospital resources.
//!
//! One static table decides which roles may read or write each resource.
//! Handlers never carry their own role lists: they call [`require`] with the
//! role from the request's session. A pair missing from the table is denied.

use crate::error::{AppError, AppResult};
use crate::models::Role;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Departments,
    Diseases,
    Medications,
    Employees,
    Patients,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Departments,
        Resource::Diseases,
        Resource::Medications,
        Resource::Employees,
        Resource::Patients,
    ];

    /// Path of the resource's list page.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Departments => "/departments",
            Resource::Diseases => "/diseases",
            Resource::Medications => "/medications",
            Resource::Employees => "/employees",
            Resource::Patients => "/patients",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

use Operation::{Read, Write};
use Resource::*;
use Role::*;

const PERMISSIONS: &[(Resource, Operation, &[Role])] = &[
    (Departments, Read, &[Nurse, Superuser]),
    (Departments, Write, &[Nurse, Superuser]),
    (Diseases, Read, &[Nurse, Doctor, Superuser]),
    (Diseases, Write, &[Doctor, Superuser]),
    (Medications, Read, &[Nurse, Superuser]),
    (Medications, Write, &[Nurse, Superuser]),
    (Employees, Read, &[Hr, Superuser, Patient, Nurse]),
    (Employees, Write, &[Hr, Superuser]),
    (Patients, Read, &[Administrator, Doctor, Superuser]),
    (Patients, Write, &[Administrator, Superuser]),
];

/// Roles allowed to perform `operation` on `resource`.
pub fn permitted_roles(resource: Resource, operation: Operation) -> &'static [Role] {
    PERMISSIONS
        .iter()
        .find(|(r, op, _)| *r == resource && *op == operation)
        .map(|(_, _, roles)| *roles)
        .unwrap_or(&[])
}

pub fn check(role: Role, resource: Resource, operation: Operation) -> Decision {
    if permitted_roles(resource, operation).contains(&role) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Like [`check`], but a denial becomes [`AppError::Forbidden`].
pub fn require(role: Role, resource: Resource, operation: Operation) -> AppResult<()> {
    match check(role, resource, operation) {
        Decision::Allow => {
            debug!(%role, ?resource, ?operation, "access granted");
            Ok(())
        }
        Decision::Deny => {
            warn!(%role, ?resource, ?operation, "access denied");
            Err(AppError::Forbidden)
        }
    }
}

/// Operations `role` may perform on `resource`, for display.
pub fn allowed_operations(role: Role, resource: Resource) -> Vec<Operation> {
    [Read, Write]
        .into_iter()
        .filter(|op| check(role, resource, *op) == Decision::Allow)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(role: Role, resource: Resource, operation: Operation) -> bool {
        check(role, resource, operation) == Decision::Allow
    }

    #[test]
    fn every_resource_has_both_operations_listed() {
        for resource in Resource::ALL {
            for operation in [Read, Write] {
                assert!(
                    !permitted_roles(resource, operation).is_empty(),
                    "{resource:?}/{operation:?} has no roles"
                );
            }
        }
    }

    #[test]
    fn superuser_may_do_everything() {
        for resource in Resource::ALL {
            assert!(allowed(Superuser, resource, Read));
            assert!(allowed(Superuser, resource, Write));
        }
    }

    #[test]
    fn nurses_manage_departments_and_medications_only() {
        assert!(allowed(Nurse, Departments, Write));
        assert!(allowed(Nurse, Medications, Write));
        assert!(allowed(Nurse, Employees, Read));
        assert!(!allowed(Nurse, Employees, Write));
        assert!(!allowed(Nurse, Patients, Read));
    }

    #[test]
    fn only_administrators_and_superusers_write_patients() {
        for role in Role::ALL {
            let expected = matches!(role, Administrator | Superuser);
            assert_eq!(allowed(role, Patients, Write), expected, "{role}");
        }
        assert!(allowed(Doctor, Patients, Read));
    }

    #[test]
    fn employees_are_readable_by_patients_but_writable_by_hr() {
        assert!(allowed(Patient, Employees, Read));
        assert!(!allowed(Patient, Employees, Write));
        assert!(allowed(Hr, Employees, Write));
        assert!(!allowed(Hr, Departments, Read));
    }

    #[test]
    fn decisions_are_deterministic() {
        for role in Role::ALL {
            for resource in Resource::ALL {
                for operation in [Read, Write] {
                    assert_eq!(
                        check(role, resource, operation),
                        check(role, resource, operation)
                    );
                }
            }
        }
    }

    #[test]
    fn require_maps_deny_to_forbidden() {
        assert!(require(Doctor, Patients, Read).is_ok());
        assert!(matches!(
            require(Doctor, Patients, Write),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn allowed_operations_lists_read_before_write() {
        assert_eq!(allowed_operations(Doctor, Patients), vec![Read]);
        assert_eq!(allowed_operations(Superuser, Patients), vec![Read, Write]);
        assert!(allowed_operations(Patient, Patients).is_empty());
    }
}
