// datadag/src/core/category.rs

//! The fixed, ordered set of SQL script categories.

use std::fmt;

/// Category of a SQL script, identified by its filename prefix.
///
/// The declaration order is the execution precedence between categories:
/// every `load-` script runs before any `staging-` script, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScriptCategory {
  Load,
  Staging,
  View,
  Api,
  Alter,
}

impl ScriptCategory {
  /// All categories in execution order.
  pub const ALL: [ScriptCategory; 5] = [
    ScriptCategory::Load,
    ScriptCategory::Staging,
    ScriptCategory::View,
    ScriptCategory::Api,
    ScriptCategory::Alter,
  ];

  /// Filename prefix, including the trailing dash.
  pub fn prefix(self) -> &'static str {
    match self {
      ScriptCategory::Load => "load-",
      ScriptCategory::Staging => "staging-",
      ScriptCategory::View => "view-",
      ScriptCategory::Api => "api-",
      ScriptCategory::Alter => "alter-",
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      ScriptCategory::Load => "load",
      ScriptCategory::Staging => "staging",
      ScriptCategory::View => "view",
      ScriptCategory::Api => "api",
      ScriptCategory::Alter => "alter",
    }
  }

  /// Category whose prefix `file_name` starts with, if any.
  pub fn of_file_name(file_name: &str) -> Option<ScriptCategory> {
    Self::ALL.into_iter().find(|c| file_name.starts_with(c.prefix()))
  }
}

impl fmt::Display for ScriptCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
