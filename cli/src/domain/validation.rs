//! Manifest validation
//!
//! Structural rules are checked first and every broken field is collected so
//! the user can fix the manifest in one pass. The target environment is only
//! looked up once the structure is sound.

use crate::domain::manifest::{Manifest, DATABASE_DRIVERS, TRIGGERS};
use crate::error::{Rule, ValidationError, Violation};

/// Upper bound for every string field in the manifest
pub const MAX_FIELD_LENGTH: usize = 256;

/// Validate a manifest against the environment being deployed to
pub fn validate(manifest: &Manifest, environment: &str) -> Result<(), ValidationError> {
    let violations = check_structure(manifest);
    if !violations.is_empty() {
        return Err(ValidationError::Invalid(violations));
    }

    if manifest.environment(environment).is_none() {
        return Err(ValidationError::EnvironmentNotFound(environment.to_string()));
    }

    Ok(())
}

/// Collect every structural violation, one per field
pub fn check_structure(manifest: &Manifest) -> Vec<Violation> {
    let mut violations = Violations::default();

    violations.text("name", &manifest.name);
    violations.choice("trigger", &manifest.trigger, TRIGGERS);

    if manifest.environments.is_empty() {
        violations.push("environments", Rule::NotEmpty);
    }

    for (i, env) in manifest.environments.iter().enumerate() {
        let prefix = format!("environments[{}]", i);
        violations.text(&format!("{}.name", prefix), &env.name);

        for (j, db) in env.databases.iter().enumerate() {
            let db_prefix = format!("{}.databases[{}]", prefix, j);
            violations.text(&format!("{}.name", db_prefix), &db.name);
            violations.choice(&format!("{}.driver", db_prefix), &db.driver, DATABASE_DRIVERS);
        }

        for (j, var) in env.variables.iter().enumerate() {
            let var_prefix = format!("{}.variables[{}]", prefix, j);
            violations.text(&format!("{}.key", var_prefix), &var.key);
            violations.text(&format!("{}.value", var_prefix), &var.value);
        }
    }

    violations.0
}

#[derive(Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn push(&mut self, field: &str, rule: Rule) {
        self.0.push(Violation {
            field: field.to_string(),
            rule,
        });
    }

    /// Required, at most MAX_FIELD_LENGTH characters
    fn text(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.push(field, Rule::Required);
        } else if value.chars().count() > MAX_FIELD_LENGTH {
            self.push(field, Rule::MaxLength(MAX_FIELD_LENGTH));
        }
    }

    /// Required, one of `allowed`
    fn choice(&mut self, field: &str, value: &str, allowed: &'static [&'static str]) {
        if value.is_empty() {
            self.push(field, Rule::Required);
        } else if !allowed.contains(&value) {
            self.push(field, Rule::OneOf(allowed));
        }
    }
}
