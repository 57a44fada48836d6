use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// The account as the backend returns it from login, refresh and `usuario/actual`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(rename = "perfil", default)]
    pub profile: Profile,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    #[serde(rename = "aprobado", default)]
    pub approved: bool,
    #[serde(rename = "rol", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(rename = "permisos", default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeMap<String, bool>>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "COLAB")]
    Collaborator,
    #[serde(rename = "VISIT")]
    Visitor,
    #[serde(other)]
    Unknown,
}

/// Permission flags the backend stores on each profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewDashboard,
    ApproveUsers,
    ViewReports,
    GenerateReports,
    ViewInventory,
    ModifyInventory,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::ViewDashboard,
        Permission::ApproveUsers,
        Permission::ViewReports,
        Permission::GenerateReports,
        Permission::ViewInventory,
        Permission::ModifyInventory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewDashboard => "VerDashboard",
            Permission::ApproveUsers => "AprobarUsuarios",
            Permission::ViewReports => "VerReportes",
            Permission::GenerateReports => "GenerarReportes",
            Permission::ViewInventory => "VerInventario",
            Permission::ModifyInventory => "ModificarInventario",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_owned()
        }
    }

    pub fn is_approved(&self) -> bool {
        self.profile.approved
    }

    pub fn is_admin(&self) -> bool {
        self.profile.role == Some(Role::Admin)
    }

    /// Unknown or absent flags count as not granted.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.profile
            .permissions
            .as_ref()
            .and_then(|flags| flags.get(permission.as_str()).copied())
            .unwrap_or(false)
    }

    pub fn granted_permissions(&self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|permission| self.has_permission(*permission))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Permission, Role, UserProfile};
    use crate::ids::UserId;

    #[test]
    fn decodes_backend_profile() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": 7,
            "username": "ana",
            "email": "ana@example.org",
            "first_name": "Ana",
            "last_name": "Rojas",
            "perfil": {
                "aprobado": true,
                "rol": "COLAB",
                "permisos": {"VerDashboard": true, "AprobarUsuarios": false}
            }
        }))
        .expect("profile should decode");

        assert_eq!(user.id, UserId(7));
        assert!(user.is_approved());
        assert_eq!(user.profile.role, Some(Role::Collaborator));
        assert!(user.has_permission(Permission::ViewDashboard));
        assert!(!user.has_permission(Permission::ApproveUsers));
        assert!(!user.has_permission(Permission::ViewReports));
        assert_eq!(user.granted_permissions(), vec![Permission::ViewDashboard]);
        assert_eq!(user.display_name(), "Ana Rojas");
    }

    #[test]
    fn minimal_profile_defaults_to_unapproved() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": 1,
            "username": "pending",
            "perfil": {"aprobado": false}
        }))
        .expect("profile should decode");

        assert!(!user.is_approved());
        assert!(!user.is_admin());
        assert!(user.granted_permissions().is_empty());
        assert_eq!(user.display_name(), "pending");
    }

    #[test]
    fn unknown_role_is_tolerated() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": 2,
            "username": "x",
            "perfil": {"aprobado": true, "rol": "AUDITOR"}
        }))
        .expect("profile should decode");

        assert_eq!(user.profile.role, Some(Role::Unknown));
    }
}
