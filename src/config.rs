//! Engine configuration
//!
//! Values come from [`Config::default`], can be overridden through `RETARGET_*`
//! environment variables with [`Config::from_env`], and are adjusted by the CLI
//! through the `with_*` setters.

use crate::consts::{OBJECT_TYPE, OVERRIDE_ANNOTATION, UNSUPPORTED_OPERATION};
use crate::error::{Error, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Universal root type; a class whose supertype is this type has no real ancestor
    pub root_type: String,
    /// Simple name of the override marker annotation
    pub override_annotation: String,
    /// Exception thrown from synthesized stubs
    pub stub_exception: String,
    /// Printer indent width in spaces
    pub indent: usize,
    /// Shorten fully qualified references after structural edits
    pub shorten_references: bool,
    /// Leave override markers inside anonymous class bodies alone
    pub ignore_anonymous_class_methods: bool,
    /// Directory of declaration sources used to seed the type table
    pub classpath: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_type: OBJECT_TYPE.to_string(),
            override_annotation: OVERRIDE_ANNOTATION.to_string(),
            stub_exception: UNSUPPORTED_OPERATION.to_string(),
            indent: 4,
            shorten_references: true,
            ignore_anonymous_class_methods: false,
            classpath: None,
        }
    }
}

impl Config {
    /// Build a configuration from defaults plus `RETARGET_*` environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(exception) = std::env::var("RETARGET_STUB_EXCEPTION") {
            if exception.trim().is_empty() {
                return Err(Error::config_error("RETARGET_STUB_EXCEPTION is empty"));
            }
            config.stub_exception = exception.trim().to_string();
        }
        if let Ok(indent) = std::env::var("RETARGET_INDENT") {
            config.indent = indent.trim().parse().map_err(|_| {
                Error::config_error(format!("RETARGET_INDENT is not a number: '{}'", indent))
            })?;
        }
        if let Ok(classpath) = std::env::var("RETARGET_CLASSPATH") {
            if !classpath.is_empty() {
                config.classpath = Some(PathBuf::from(classpath));
            }
        }
        log::debug!("config from env: {:?}", config);
        Ok(config)
    }

    pub fn with_stub_exception(mut self, exception: impl Into<String>) -> Self {
        self.stub_exception = exception.into();
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_shorten_references(mut self, shorten: bool) -> Self {
        self.shorten_references = shorten;
        self
    }

    pub fn with_ignore_anonymous_class_methods(mut self, ignore: bool) -> Self {
        self.ignore_anonymous_class_methods = ignore;
        self
    }

    pub fn with_classpath(mut self, classpath: impl Into<PathBuf>) -> Self {
        self.classpath = Some(classpath.into());
        self
    }
}
