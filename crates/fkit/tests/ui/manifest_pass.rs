use fkit::prelude::*;

#[derive(Debug)]
pub struct Toggle(bool);

impl FromVariables for Toggle {
    fn from_variables(variables: &dyn Variables) -> Result<Self, VariablesError> {
        Ok(Self(variables.get_bool("enabled").unwrap_or(false)))
    }
}

fn always_on(_: &dyn Variables) -> Result<Toggle, VariablesError> {
    Ok(Toggle(true))
}

#[feature_manifest(crate = "::fkit")]
#[derive(Debug)]
struct Features {
    #[feature(name = "dark-mode")]
    dark_mode: Toggle,
    #[feature(with = always_on)]
    telemetry: Toggle,
}

fn main() {
    let features = Features::new();
    assert!(!features.dark_mode().value().unwrap().0);
    assert!(features.telemetry().value().unwrap().0);
    assert_eq!(features.len(), 2);
    assert!(features.holder::<Toggle>("dark-mode").is_ok());
}
