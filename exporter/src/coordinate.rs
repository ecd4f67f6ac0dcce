//! Maven coordinates and resolved artifact records.
//!
//! A [`ResolvedArtifact`] is handed over by the host build's dependency
//! resolution. Only artifacts whose component is a Maven module can be
//! exported; the [`ModuleCoordinate`] view derived from them yields the
//! display name and the repository-relative path used when probing remote
//! repositories.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors arising from invalid module component values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinateError {
    /// One of group, module or version is blank.
    #[error("module component has an empty {field}")]
    EmptyField {
        /// The blank field name.
        field: &'static str,
    },
}

/// A Maven module identity: `group:module:version`.
///
/// Unique snapshots additionally carry the timestamped version that the
/// repository stores the file under, e.g. `1.0-20230101.120000-1` for the
/// display version `1.0-SNAPSHOT`.
///
/// # Examples
///
/// ```
/// use depexport::coordinate::ModuleComponent;
///
/// let component = ModuleComponent::new("com.example", "lib", "1.0").expect("valid component");
/// assert_eq!(component.to_string(), "com.example:lib:1.0");
/// assert!(ModuleComponent::new("", "lib", "1.0").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawModuleComponent")]
pub struct ModuleComponent {
    group: String,
    module: String,
    version: String,
    timestamped_version: Option<String>,
}

impl ModuleComponent {
    /// Create a module component, rejecting blank fields.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError::EmptyField`] naming the first blank field.
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        let component = Self {
            group: group.into(),
            module: module.into(),
            version: version.into(),
            timestamped_version: None,
        };
        component.validate()?;
        Ok(component)
    }

    /// Attach the timestamped version of a unique snapshot.
    #[must_use]
    pub fn with_timestamped_version(mut self, timestamped_version: impl Into<String>) -> Self {
        self.timestamped_version = Some(timestamped_version.into());
        self
    }

    /// Return the dot-separated group.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Return the module (artifact id).
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Return the display version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the timestamped version for unique snapshots.
    #[must_use]
    pub fn timestamped_version(&self) -> Option<&str> {
        self.timestamped_version.as_deref()
    }

    /// Return the version the repository stores the file under.
    #[must_use]
    pub fn file_version(&self) -> &str {
        self.timestamped_version().unwrap_or(&self.version)
    }

    fn validate(&self) -> Result<(), CoordinateError> {
        let fields = [
            ("group", &self.group),
            ("module", &self.module),
            ("version", &self.version),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(CoordinateError::EmptyField { field: *field }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ModuleComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModuleComponent {
    group: String,
    module: String,
    version: String,
    #[serde(default)]
    timestamped_version: Option<String>,
}

impl TryFrom<RawModuleComponent> for ModuleComponent {
    type Error = CoordinateError;

    fn try_from(raw: RawModuleComponent) -> Result<Self, Self::Error> {
        let component = Self::new(raw.group, raw.module, raw.version)?;
        Ok(match raw.timestamped_version {
            Some(timestamped) => component.with_timestamped_version(timestamped),
            None => component,
        })
    }
}

/// The identity of a resolved artifact's owning component.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Component {
    /// A module fetched from a Maven-style repository.
    Module(ModuleComponent),
    /// A file or project dependency with no module coordinate.
    Local {
        /// Human-readable identifier reported by the build.
        name: String,
    },
}

/// One artifact produced by the host build's dependency resolution.
///
/// # Examples
///
/// ```
/// use depexport::coordinate::{ModuleComponent, ResolvedArtifact};
///
/// let component = ModuleComponent::new("org.lwjgl", "lwjgl", "3.3.1").expect("valid component");
/// let artifact = ResolvedArtifact::module(component, "jar", "/cache/lwjgl-3.3.1-natives-linux.jar")
///     .with_classifier("natives-linux");
/// let coordinate = artifact.coordinate().expect("module artifact");
/// assert_eq!(coordinate.name(), "org.lwjgl:lwjgl:3.3.1:natives-linux");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedArtifact {
    component: Component,
    #[serde(default)]
    classifier: Option<String>,
    extension: String,
    file: PathBuf,
}

impl ResolvedArtifact {
    /// Create an artifact owned by a Maven module.
    #[must_use]
    pub fn module(
        component: ModuleComponent,
        extension: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            component: Component::Module(component),
            classifier: None,
            extension: extension.into(),
            file: file.into(),
        }
    }

    /// Create an artifact with no module coordinate.
    #[must_use]
    pub fn local(
        name: impl Into<String>,
        extension: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            component: Component::Local { name: name.into() },
            classifier: None,
            extension: extension.into(),
            file: file.into(),
        }
    }

    /// Attach a classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Return the owning component.
    #[must_use]
    pub fn component(&self) -> &Component {
        &self.component
    }

    /// Return the classifier, if any.
    #[must_use]
    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// Return the file extension, without a leading dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Return the path of the already-downloaded local file.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Return the module coordinate, or `None` for non-module artifacts.
    #[must_use]
    pub fn coordinate(&self) -> Option<ModuleCoordinate<'_>> {
        match &self.component {
            Component::Module(component) => Some(ModuleCoordinate {
                component,
                classifier: self.classifier(),
                extension: &self.extension,
            }),
            Component::Local { .. } => None,
        }
    }

    /// Resolve a relative local file path against `base`.
    pub(crate) fn rebase_file(&mut self, base: &Path) {
        if self.file.is_relative() {
            self.file = base.join(&self.file);
        }
    }
}

/// A module artifact's full coordinate: component, classifier and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleCoordinate<'a> {
    component: &'a ModuleComponent,
    classifier: Option<&'a str>,
    extension: &'a str,
}

impl ModuleCoordinate<'_> {
    /// Return the owning module component.
    #[must_use]
    pub fn component(&self) -> &ModuleComponent {
        self.component
    }

    /// Return the classifier, if any.
    #[must_use]
    pub fn classifier(&self) -> Option<&str> {
        self.classifier
    }

    /// Return `group:module:version`, suffixed with `:classifier` when present.
    #[must_use]
    pub fn name(&self) -> String {
        match self.classifier {
            Some(classifier) => format!("{}:{classifier}", self.component),
            None => self.component.to_string(),
        }
    }

    /// Return the Maven repository layout path of the artifact file.
    ///
    /// The version directory always uses the display version; the file name
    /// uses the timestamped version for unique snapshots.
    ///
    /// # Examples
    ///
    /// ```
    /// use depexport::coordinate::{ModuleComponent, ResolvedArtifact};
    ///
    /// let component = ModuleComponent::new("com.example", "lib", "1.0-SNAPSHOT")
    ///     .expect("valid component")
    ///     .with_timestamped_version("1.0-20230101.120000-1");
    /// let artifact = ResolvedArtifact::module(component, "jar", "lib.jar");
    /// let coordinate = artifact.coordinate().expect("module artifact");
    /// assert_eq!(
    ///     coordinate.repository_path(),
    ///     "com/example/lib/1.0-SNAPSHOT/lib-1.0-20230101.120000-1.jar"
    /// );
    /// ```
    #[must_use]
    pub fn repository_path(&self) -> String {
        let component = self.component;
        let mut path = format!(
            "{}/{}/{}/{}-{}",
            component.group().replace('.', "/"),
            component.module(),
            component.version(),
            component.module(),
            component.file_version(),
        );
        if let Some(classifier) = self.classifier {
            path.push('-');
            path.push_str(classifier);
        }
        path.push('.');
        path.push_str(self.extension);
        path
    }
}

impl fmt::Display for ModuleCoordinate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
