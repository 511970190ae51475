pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_chat_schema;
mod m20250101_000002_create_users_and_profiles;
mod m20250101_000003_create_messages;

/// Schema every chat table lives in.
pub(crate) const SCHEMA: &str = "chat";

pub(crate) fn schema() -> Alias {
    Alias::new(SCHEMA)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_chat_schema::Migration),
            Box::new(m20250101_000002_create_users_and_profiles::Migration),
            Box::new(m20250101_000003_create_messages::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_applied_in_name_order() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 3);
    }
}
