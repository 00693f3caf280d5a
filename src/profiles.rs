use crate::errors::AppError;
use crate::report_models::{EnterpriseList, EnterpriseListItem};
use serde::Serialize;

/// Static description of one entity the dashboard can analyse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityProfile {
    pub id: String,
    pub display_name: String,
    pub rating_label: String,
    /// Creditworthiness proxy in (0, 1]; 1.0 is the best.
    pub scale_multiplier: f64,
}

impl EntityProfile {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        rating_label: impl Into<String>,
        scale_multiplier: f64,
    ) -> Result<Self, AppError> {
        let id = id.into();
        // NaN fails both comparisons and is rejected here too.
        if !(scale_multiplier > 0.0 && scale_multiplier <= 1.0) {
            return Err(AppError::Internal(format!(
                "Entity {} has scale multiplier {} outside (0, 1]",
                id, scale_multiplier
            )));
        }
        Ok(Self {
            id,
            display_name: display_name.into(),
            rating_label: rating_label.into(),
            scale_multiplier,
        })
    }
}

/// Registry of entity profiles, read-only after construction.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: Vec<EntityProfile>,
    reference_id: String,
}

impl ProfileTable {
    /// Builds a table. The reference entity must be one of `profiles`.
    pub fn new(
        profiles: Vec<EntityProfile>,
        reference_id: impl Into<String>,
    ) -> Result<Self, AppError> {
        let reference_id = reference_id.into();
        if !profiles.iter().any(|p| p.id == reference_id) {
            return Err(AppError::Internal(format!(
                "Reference entity {} is not in the profile table",
                reference_id
            )));
        }
        for (i, profile) in profiles.iter().enumerate() {
            if profiles[..i].iter().any(|p| p.id == profile.id) {
                return Err(AppError::Internal(format!(
                    "Duplicate entity id {}",
                    profile.id
                )));
            }
        }
        Ok(Self {
            profiles,
            reference_id,
        })
    }

    /// The three entities the dashboard ships with; E001 is the reference.
    pub fn builtin() -> Result<Self, AppError> {
        Self::new(
            vec![
                EntityProfile::new("E001", "Huaxia Supply Chain Technology Co., Ltd.", "AAA", 1.0)?,
                EntityProfile::new("E002", "Dongfang Logistics Group", "AA", 0.85)?,
                EntityProfile::new("E003", "Shengshi Trading Co., Ltd.", "A", 0.72)?,
            ],
            "E001",
        )
    }

    pub fn get(&self, id: &str) -> Option<&EntityProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn reference(&self) -> &EntityProfile {
        // Presence is checked in `new`.
        self.get(&self.reference_id).unwrap_or(&self.profiles[0])
    }

    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityProfile> {
        self.profiles.iter()
    }

    pub fn list_entities(&self) -> EnterpriseList {
        let enterprises: Vec<EnterpriseListItem> = self
            .profiles
            .iter()
            .map(|p| EnterpriseListItem {
                id: p.id.clone(),
                name: p.display_name.clone(),
                credit_rating: p.rating_label.clone(),
            })
            .collect();
        EnterpriseList {
            total: enterprises.len(),
            enterprises,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = ProfileTable::builtin().unwrap();
        assert_eq!(table.reference().id, "E001");
        assert_eq!(table.reference().scale_multiplier, 1.0);
        assert_eq!(table.get("E003").unwrap().scale_multiplier, 0.72);
        assert!(table.get("E999").is_none());

        for profile in table.iter() {
            assert!(profile.scale_multiplier > 0.0 && profile.scale_multiplier <= 1.0);
        }
    }

    #[test]
    fn test_multiplier_bounds() {
        assert!(EntityProfile::new("X", "X", "B", 0.0).is_err());
        assert!(EntityProfile::new("X", "X", "B", 1.01).is_err());
        assert!(EntityProfile::new("X", "X", "B", f64::NAN).is_err());
        assert!(EntityProfile::new("X", "X", "B", -0.5).is_err());
        assert!(EntityProfile::new("X", "X", "B", 1.0).is_ok());
        assert!(EntityProfile::new("X", "X", "B", 0.01).is_ok());
    }

    #[test]
    fn test_reference_must_exist_and_ids_unique() {
        let a = EntityProfile::new("A", "Alpha", "AA", 0.9).unwrap();
        assert!(ProfileTable::new(vec![a.clone()], "B").is_err());
        assert!(ProfileTable::new(vec![a.clone(), a.clone()], "A").is_err());
    }

    #[test]
    fn test_list_entities() {
        let list = ProfileTable::builtin().unwrap().list_entities();
        assert_eq!(list.total, 3);
        assert_eq!(list.enterprises[1].credit_rating, "AA");
    }
}
