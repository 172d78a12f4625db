//! Diagnostics
//!
//! Collects findings while building the model. Nothing recorded here stops a
//! run: every finding comes with a fallback that has already been applied.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Definition matched no known shape, fell back to `any`
    UnknownPattern,
    /// `allOf` parent reference names no definition
    UnresolvedParent,
    /// Two definition names normalise to the same registry key
    KeyCollision,
    /// Tuple without `maxItems`, degraded to `Array<any>`
    UnboundedTuple,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownPattern => "W001",
            Self::UnresolvedParent => "W002",
            Self::KeyCollision => "W003",
            Self::UnboundedTuple => "I001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnknownPattern | Self::UnresolvedParent | Self::KeyCollision => Severity::Warning,
            Self::UnboundedTuple => Severity::Info,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Definition that caused this diagnostic
    pub schema_id: String,
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(schema_id: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            schema_id: schema_id.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.schema_id
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        if item.severity() >= Severity::Warning {
            tracing::warn!("{}", item);
        } else {
            tracing::debug!("{}", item);
        }
        self.items.push(item);
    }

    pub fn unknown_pattern(&mut self, schema_id: &str) {
        self.push(DiagnosticItem::new(
            schema_id,
            DiagnosticCode::UnknownPattern,
            "definition has no recognizable shape, using 'any'",
        ));
    }

    pub fn unresolved_parent(&mut self, schema_id: &str, parent: &str) {
        self.push(DiagnosticItem::new(
            schema_id,
            DiagnosticCode::UnresolvedParent,
            format!("parent '{}' not found among definitions", parent),
        ));
    }

    pub fn key_collision(&mut self, schema_id: &str, key: &str, previous: &str) {
        self.push(
            DiagnosticItem::new(
                schema_id,
                DiagnosticCode::KeyCollision,
                format!("registry key '{}' was already taken, replacing it", key),
            )
            .with_context(format!("previous definition: {}", previous)),
        );
    }

    pub fn unbounded_tuple(&mut self, schema_id: &str, path: &str) {
        self.push(
            DiagnosticItem::new(
                schema_id,
                DiagnosticCode::UnboundedTuple,
                "tuple declares no maxItems, using Array<any>",
            )
            .with_context(format!("at {}", path)),
        );
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn format_all(&self) -> String {
        let mut output = String::new();
        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }
        if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }
        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}
