use crate::routes::normalize_path;

/// Header shown above a dashboard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub title: &'static str,
    pub subtitle: &'static str,
}

impl PageInfo {
    pub fn for_path(path: &str) -> Self {
        let path = normalize_path(path);
        if path.contains("user-management") {
            Self {
                title: "Gestion des Utilisateurs",
                subtitle: "Gérez les comptes utilisateurs et leurs permissions",
            }
        } else if path.contains("declaration-type-management") {
            Self {
                title: "Gestion des Types de Déclarations",
                subtitle: "Configurez les types de déclarations réglementaires BCT",
            }
        } else {
            Self {
                title: "Tableau de bord",
                subtitle: "Vue d'ensemble de votre espace d'administration",
            }
        }
    }
}
