use fkit_domain::{FromVariables, Variables, VariablesError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Builds a typed configuration value from a feature's variables.
pub type Constructor<T> =
    Arc<dyn Fn(&dyn Variables) -> Result<T, VariablesError> + Send + Sync + 'static>;

/// Renders a configuration value as JSON for the type-erased [`Feature`](crate::Feature) view.
pub type Renderer<T> = fn(&T) -> Result<Value, serde_json::Error>;

pub(crate) struct DescriptorParts<T> {
    pub(crate) name: Cow<'static, str>,
    pub(crate) doc: Option<Cow<'static, str>>,
    pub(crate) constructor: Constructor<T>,
    pub(crate) render: Option<Renderer<T>>,
}

/// Everything a registry needs to create a [`FeatureHolder`](crate::FeatureHolder):
/// the feature id, its constructor, optional documentation and an optional JSON renderer.
pub struct FeatureDescriptor<T> {
    name: Cow<'static, str>,
    doc: Option<Cow<'static, str>>,
    constructor: Constructor<T>,
    render: Option<Renderer<T>>,
}

impl<T> FeatureDescriptor<T> {
    #[must_use = "a descriptor does nothing until it is registered"]
    pub fn new<F>(name: impl Into<Cow<'static, str>>, constructor: F) -> Self
    where
        F: Fn(&dyn Variables) -> Result<T, VariablesError> + Send + Sync + 'static,
    {
        Self { name: name.into(), doc: None, constructor: Arc::new(constructor), render: None }
    }

    #[must_use = "a descriptor does nothing until it is registered"]
    pub fn with_doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub const fn is_serializable(&self) -> bool {
        self.render.is_some()
    }

    /// Runs the constructor against `variables` without involving any holder.
    ///
    /// # Errors
    ///
    /// Returns whatever the constructor reports.
    pub fn construct(&self, variables: &dyn Variables) -> Result<T, VariablesError> {
        (self.constructor)(variables)
    }

    pub(crate) fn into_parts(self) -> DescriptorParts<T> {
        DescriptorParts {
            name: self.name,
            doc: self.doc,
            constructor: self.constructor,
            render: self.render,
        }
    }
}

impl<T: FromVariables + 'static> FeatureDescriptor<T> {
    /// A descriptor using `T`'s [`FromVariables`] implementation.
    #[must_use = "a descriptor does nothing until it is registered"]
    pub fn from_variables(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, T::from_variables)
    }
}

impl<T: DeserializeOwned + 'static> FeatureDescriptor<T> {
    /// A descriptor that deserializes the whole variables object into `T`.
    #[must_use = "a descriptor does nothing until it is registered"]
    pub fn deserialize(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, fkit_domain::deserialize::<T>)
    }
}

impl<T: Serialize + 'static> FeatureDescriptor<T> {
    /// Lets [`Feature::value_json`](crate::Feature::value_json) render this feature's value.
    #[must_use = "a descriptor does nothing until it is registered"]
    pub fn serializable(mut self) -> Self {
        let render: Renderer<T> = to_json::<T>;
        self.render = Some(render);
        self
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

impl<T> Clone for FeatureDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            doc: self.doc.clone(),
            constructor: Arc::clone(&self.constructor),
            render: self.render,
        }
    }
}

impl<T> fmt::Debug for FeatureDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureDescriptor")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("serializable", &self.is_serializable())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fkit_domain::JsonVariables;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    struct Homescreen {
        sections: Vec<String>,
    }

    #[test]
    fn test_deserialize_descriptor_reads_whole_object() {
        let descriptor = FeatureDescriptor::<Homescreen>::deserialize("home-screen");
        let variables = JsonVariables::from_value(json!({ "sections": ["top-sites"] })).unwrap();

        let value = descriptor.construct(&variables).unwrap();
        assert_eq!(value.sections, ["top-sites"]);
        assert_eq!(descriptor.name(), "home-screen");
    }

    #[test]
    fn test_doc_is_attached() {
        let descriptor = FeatureDescriptor::new("settings", |v: &dyn Variables| {
            Ok(v.get_bool("punctuation-enabled").unwrap_or(false))
        })
        .with_doc("Editor settings");

        assert_eq!(descriptor.doc(), Some("Editor settings"));
        assert!(!descriptor.construct(&JsonVariables::empty()).unwrap());
        assert!(!descriptor.is_serializable());
    }

    #[test]
    fn test_serializable_survives_clone() {
        let descriptor = FeatureDescriptor::<Homescreen>::deserialize("home-screen");
        assert!(!descriptor.is_serializable());

        let descriptor = FeatureDescriptor::new("limit", |v: &dyn Variables| Ok(v.get_int("n").unwrap_or(3)))
            .serializable();
        assert!(descriptor.clone().is_serializable());
        assert!(format!("{descriptor:?}").contains("serializable: true"));
    }
}
