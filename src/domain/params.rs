//! Export request parameters
//!
//! This module defines [`ParameterSet`], the validated, immutable description
//! of one export request, and the enumerations its fields draw from. Every
//! enumerated field is checked at construction, never at transport time, so
//! a [`ParameterSet`] that exists is always serializable into a well-formed
//! request body.

use std::fmt;
use std::str::FromStr;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::secret::SecretString;
use crate::domain::errors::ValidationError;

/// Export target understood by the API
///
/// The wire spelling of each variant matches the API's `content` parameter
/// exactly (note the camelCase of `formEventMapping`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportContent {
    /// Record data (requires a record [`RecordType`])
    Record,
    /// Project settings
    Project,
    /// Data dictionary
    Metadata,
    /// Instrument list
    Instrument,
    /// Event list (longitudinal projects)
    Event,
    /// Arm list (longitudinal projects)
    Arm,
    /// Project users
    User,
    /// A saved report
    Report,
    /// API version string
    Version,
    /// Instrument-event mappings
    FormEventMapping,
}

impl ExportContent {
    /// Wire spelling sent as the `content` value
    pub fn as_wire(self) -> &'static str {
        match self {
            ExportContent::Record => "record",
            ExportContent::Project => "project",
            ExportContent::Metadata => "metadata",
            ExportContent::Instrument => "instrument",
            ExportContent::Event => "event",
            ExportContent::Arm => "arm",
            ExportContent::User => "user",
            ExportContent::Report => "report",
            ExportContent::Version => "version",
            ExportContent::FormEventMapping => "formEventMapping",
        }
    }
}

impl fmt::Display for ExportContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for ExportContent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "record" => Ok(ExportContent::Record),
            "project" => Ok(ExportContent::Project),
            "metadata" => Ok(ExportContent::Metadata),
            "instrument" => Ok(ExportContent::Instrument),
            "event" => Ok(ExportContent::Event),
            "arm" => Ok(ExportContent::Arm),
            "user" => Ok(ExportContent::User),
            "report" => Ok(ExportContent::Report),
            "version" => Ok(ExportContent::Version),
            "formEventMapping" => Ok(ExportContent::FormEventMapping),
            other => Err(ValidationError::new(
                "content",
                format!(
                    "unknown content type '{other}'. Must be one of: record, project, \
                     metadata, instrument, event, arm, user, report, version, formEventMapping"
                ),
            )),
        }
    }
}

/// Serialization format requested for the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// JSON
    Json,
    /// XML
    Xml,
}

impl ExportFormat {
    /// Wire spelling sent as the `format` / `returnFormat` value
    pub fn as_wire(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "xml" => Ok(ExportFormat::Xml),
            other => Err(ValidationError::new(
                "format",
                format!("unknown format '{other}'. Must be one of: csv, json, xml"),
            )),
        }
    }
}

/// Record shape for `content = record` exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// One row per record
    Flat,
    /// One row per data point (entity-attribute-value)
    Eav,
}

impl RecordType {
    /// Wire spelling sent as the `type` value
    pub fn as_wire(self) -> &'static str {
        match self {
            RecordType::Flat => "flat",
            RecordType::Eav => "eav",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for RecordType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(RecordType::Flat),
            "eav" => Ok(RecordType::Eav),
            other => Err(ValidationError::new(
                "type",
                format!("unknown record type '{other}'. Must be one of: flat, eav"),
            )),
        }
    }
}

/// Raw-value vs label rendering for exported data and headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelMode {
    /// Stored raw values
    #[default]
    Raw,
    /// Human-readable labels
    Label,
}

impl LabelMode {
    /// Wire spelling sent as the `rawOrLabel` / `rawOrLabelHeaders` value
    pub fn as_wire(self) -> &'static str {
        match self {
            LabelMode::Raw => "raw",
            LabelMode::Label => "label",
        }
    }
}

impl fmt::Display for LabelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for LabelMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(LabelMode::Raw),
            "label" => Ok(LabelMode::Label),
            other => Err(ValidationError::new(
                "rawOrLabel",
                format!("unknown label mode '{other}'. Must be one of: raw, label"),
            )),
        }
    }
}

/// A single value in the wire form
///
/// Scalar values serialize as `key=value`; list values serialize as repeated
/// `key[]=item` entries in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Single value
    Scalar(String),
    /// Ordered multi-value sequence
    List(Vec<String>),
}

/// Validated, immutable description of one export request
///
/// A `ParameterSet` is constructed once through [`ParameterSet::builder`],
/// validated at construction, and never mutated afterwards. That immutability
/// is what lets [`ExportClient`](crate::client::ExportClient) safely reuse it
/// across retries of the same logical request.
///
/// The token is held as a [`SecretString`] and is redacted from `Debug`
/// output; it only leaves the process inside the wire form.
///
/// # Example
///
/// ```
/// use redcap_export::domain::{ExportContent, ExportFormat, ParameterSet, RecordType};
///
/// # fn example() -> Result<(), redcap_export::domain::ValidationError> {
/// let params = ParameterSet::builder()
///     .token("0123456789ABCDEF")
///     .content(ExportContent::Record)
///     .format(ExportFormat::Csv)
///     .record_type(RecordType::Flat)
///     .forms(vec!["blackthorn_fmri".to_string()])
///     .build()?;
///
/// assert_eq!(params.format(), ExportFormat::Csv);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ParameterSet {
    token: SecretString,
    content: ExportContent,
    format: ExportFormat,
    record_type: Option<RecordType>,
    raw_or_label: LabelMode,
    raw_or_label_headers: LabelMode,
    export_checkbox_label: bool,
    export_survey_fields: bool,
    export_data_access_groups: bool,
    return_format: ExportFormat,
    filter_logic: Option<String>,
    records: Vec<String>,
    fields: Vec<String>,
    forms: Vec<String>,
    events: Vec<String>,
}

impl ParameterSet {
    /// Start building a parameter set
    pub fn builder() -> ParameterSetBuilder {
        ParameterSetBuilder::default()
    }

    /// The export target
    pub fn content(&self) -> ExportContent {
        self.content
    }

    /// The requested response serialization
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// The record shape (present iff `content == record`)
    pub fn record_type(&self) -> Option<RecordType> {
        self.record_type
    }

    /// The format the API should use for error responses
    pub fn return_format(&self) -> ExportFormat {
        self.return_format
    }

    /// Produces the exact key/value set the transport layer will serialize
    ///
    /// Key order is fixed and sequence order is the caller-supplied order, so
    /// the resulting body is stable across calls. Keys whose sequence value
    /// is empty are omitted entirely: in the API's semantics an omitted
    /// `forms`/`records`/`fields`/`events` key means "all".
    ///
    /// Pure transformation; no side effects.
    pub fn to_wire_form(&self) -> Vec<(String, WireValue)> {
        let mut form: Vec<(String, WireValue)> = Vec::with_capacity(15);

        let scalar = |form: &mut Vec<(String, WireValue)>, key: &str, value: String| {
            form.push((key.to_string(), WireValue::Scalar(value)));
        };

        scalar(
            &mut form,
            "token",
            self.token.expose_secret().as_ref().to_string(),
        );
        scalar(&mut form, "content", self.content.as_wire().to_string());
        scalar(&mut form, "format", self.format.as_wire().to_string());

        if let Some(record_type) = self.record_type {
            scalar(&mut form, "type", record_type.as_wire().to_string());
        }

        for (key, values) in [
            ("records", &self.records),
            ("fields", &self.fields),
            ("forms", &self.forms),
            ("events", &self.events),
        ] {
            if !values.is_empty() {
                form.push((key.to_string(), WireValue::List(values.clone())));
            }
        }

        scalar(&mut form, "rawOrLabel", self.raw_or_label.as_wire().to_string());
        scalar(
            &mut form,
            "rawOrLabelHeaders",
            self.raw_or_label_headers.as_wire().to_string(),
        );
        scalar(
            &mut form,
            "exportCheckboxLabel",
            bool_wire(self.export_checkbox_label),
        );
        scalar(
            &mut form,
            "exportSurveyFields",
            bool_wire(self.export_survey_fields),
        );
        scalar(
            &mut form,
            "exportDataAccessGroups",
            bool_wire(self.export_data_access_groups),
        );
        scalar(
            &mut form,
            "returnFormat",
            self.return_format.as_wire().to_string(),
        );

        if let Some(ref filter) = self.filter_logic {
            scalar(&mut form, "filterLogic", filter.clone());
        }

        form
    }
}

/// Boolean flags go on the wire as the strings the API expects
fn bool_wire(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Builder for [`ParameterSet`]
///
/// All validation happens in [`build`](ParameterSetBuilder::build), which
/// fails with the first violation it finds.
#[derive(Debug, Default)]
pub struct ParameterSetBuilder {
    token: Option<SecretString>,
    content: Option<ExportContent>,
    format: Option<ExportFormat>,
    record_type: Option<RecordType>,
    raw_or_label: LabelMode,
    raw_or_label_headers: LabelMode,
    export_checkbox_label: bool,
    export_survey_fields: bool,
    export_data_access_groups: bool,
    return_format: Option<ExportFormat>,
    filter_logic: Option<String>,
    records: Vec<String>,
    fields: Vec<String>,
    forms: Vec<String>,
    events: Vec<String>,
}

impl ParameterSetBuilder {
    /// Sets the API authentication token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(crate::config::secret::secret_string(token.into()));
        self
    }

    /// Sets an already-protected API authentication token
    pub fn token_secret(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Sets the export target
    pub fn content(mut self, content: ExportContent) -> Self {
        self.content = Some(content);
        self
    }

    /// Sets the response serialization format
    pub fn format(mut self, format: ExportFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the record shape (only valid when content is `record`)
    pub fn record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self
    }

    /// Sets raw-vs-label rendering for data values (default `raw`)
    pub fn raw_or_label(mut self, mode: LabelMode) -> Self {
        self.raw_or_label = mode;
        self
    }

    /// Sets raw-vs-label rendering for CSV headers (default `raw`)
    pub fn raw_or_label_headers(mut self, mode: LabelMode) -> Self {
        self.raw_or_label_headers = mode;
        self
    }

    /// Export checkbox labels instead of checked/unchecked (default false)
    pub fn export_checkbox_label(mut self, enabled: bool) -> Self {
        self.export_checkbox_label = enabled;
        self
    }

    /// Include survey identifier and timestamp fields (default false)
    pub fn export_survey_fields(mut self, enabled: bool) -> Self {
        self.export_survey_fields = enabled;
        self
    }

    /// Include data access group assignments (default false)
    pub fn export_data_access_groups(mut self, enabled: bool) -> Self {
        self.export_data_access_groups = enabled;
        self
    }

    /// Sets the format for API error responses (defaults to `format`)
    pub fn return_format(mut self, format: ExportFormat) -> Self {
        self.return_format = Some(format);
        self
    }

    /// Sets a filter expression; an empty string is treated as absent
    pub fn filter_logic(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        self.filter_logic = if filter.is_empty() { None } else { Some(filter) };
        self
    }

    /// Restricts the export to the given record identifiers (empty = all)
    pub fn records(mut self, records: Vec<String>) -> Self {
        self.records = records;
        self
    }

    /// Restricts the export to the given field names (empty = all)
    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Restricts the export to the given instruments (empty = all)
    pub fn forms(mut self, forms: Vec<String>) -> Self {
        self.forms = forms;
        self
    }

    /// Restricts the export to the given unique event names (empty = all)
    pub fn events(mut self, events: Vec<String>) -> Self {
        self.events = events;
        self
    }

    /// Validates the accumulated fields and constructs the [`ParameterSet`]
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found:
    /// - `token` missing or empty
    /// - `content` or `format` missing
    /// - `type` missing when content is `record`, or supplied for any other
    ///   content
    /// - any sequence member that is an empty string
    pub fn build(self) -> Result<ParameterSet, ValidationError> {
        let token = self
            .token
            .ok_or_else(|| ValidationError::new("token", "required"))?;
        if token.expose_secret().is_empty() {
            return Err(ValidationError::new("token", "must not be empty"));
        }

        let content = self
            .content
            .ok_or_else(|| ValidationError::new("content", "required"))?;
        let format = self
            .format
            .ok_or_else(|| ValidationError::new("format", "required"))?;

        match (content, self.record_type) {
            (ExportContent::Record, None) => {
                return Err(ValidationError::new(
                    "type",
                    "required when content is 'record'",
                ));
            }
            (ExportContent::Record, Some(_)) => {}
            (_, Some(_)) => {
                return Err(ValidationError::new(
                    "type",
                    format!("only valid when content is 'record', not '{content}'"),
                ));
            }
            (_, None) => {}
        }

        for (key, values) in [
            ("records", &self.records),
            ("fields", &self.fields),
            ("forms", &self.forms),
            ("events", &self.events),
        ] {
            if values.iter().any(String::is_empty) {
                return Err(ValidationError::new(
                    key,
                    "identifiers must be non-empty strings",
                ));
            }
        }

        Ok(ParameterSet {
            token,
            content,
            format,
            record_type: self.record_type,
            raw_or_label: self.raw_or_label,
            raw_or_label_headers: self.raw_or_label_headers,
            export_checkbox_label: self.export_checkbox_label,
            export_survey_fields: self.export_survey_fields,
            export_data_access_groups: self.export_data_access_groups,
            return_format: self.return_format.unwrap_or(format),
            filter_logic: self.filter_logic,
            records: self.records,
            fields: self.fields,
            forms: self.forms,
            events: self.events,
        })
    }
}
