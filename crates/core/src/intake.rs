//! Intake submissions: client-supplied drafts and their validated forms.
//!
//! Drafts mirror what arrives over the wire, with every field optional so
//! that a missing value is reported by name instead of as a parse failure.
//! `validate` turns a draft into a value the store can persist without
//! further checks. All validation happens here, before any write.

use crate::date::{parse_calendar_date, parse_optional_date};
use crate::error::{Error, Result};
use serde::Deserialize;
use time::Date;

/// Client and intake header fields as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInfoDraft {
    pub email: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub sample_count: Option<i32>,
    pub method_number: Option<String>,
    pub revision_number: Option<i32>,
    pub project_location: Option<String>,
    pub sampled_by: Option<String>,
    pub turnaround: Option<String>,
}

/// One sample as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleDraft {
    pub label: Option<String>,
    pub sample_date: Option<String>,
    pub mass: Option<f64>,
    pub air_volume: Option<f64>,
    pub surface_area: Option<f64>,
}

/// A complete intake submission as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionDraft {
    pub client_info: Option<ClientInfoDraft>,
    pub samples: Option<Vec<SampleDraft>>,
}

/// Staff-side project creation for an already-known client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectDraft {
    pub client_id: Option<i64>,
    pub sample_count: Option<i32>,
    pub method_number: Option<String>,
    pub revision_number: Option<i32>,
    pub due_date: Option<String>,
}

/// Identity of a submitting client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub email: String,
    pub name: String,
    pub company: String,
}

/// Reference to an analytical method revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    pub method_number: String,
    pub revision_number: i32,
}

/// Validated intake header.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeHeader {
    pub client: ClientIdentity,
    /// Declared count. Not reconciled against the number of samples.
    pub sample_count: i32,
    pub method: MethodRef,
    pub project_location: Option<String>,
    pub sampled_by: Option<String>,
    pub turnaround: Option<String>,
}

/// How a sample was collected. Exactly one measurement per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// Air volume in liters.
    AirVolume(f64),
    /// Wiped surface area in square centimeters.
    SurfaceArea(f64),
}

impl Measurement {
    pub fn air_volume(&self) -> Option<f64> {
        match self {
            Self::AirVolume(v) => Some(*v),
            Self::SurfaceArea(_) => None,
        }
    }

    pub fn surface_area(&self) -> Option<f64> {
        match self {
            Self::SurfaceArea(v) => Some(*v),
            Self::AirVolume(_) => None,
        }
    }
}

/// Validated sample ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSample {
    pub label: String,
    pub sample_date: Date,
    pub mass: Option<f64>,
    pub measurement: Measurement,
}

/// Validated intake submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub header: IntakeHeader,
    pub samples: Vec<NewSample>,
}

/// Validated project creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub client_id: i64,
    pub sample_count: i32,
    pub method: MethodRef,
    pub due_date: Option<Date>,
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::MissingField(field)),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positive_count(value: Option<i32>, field: &'static str) -> Result<i32> {
    let count = value.ok_or(Error::MissingField(field))?;
    if count <= 0 {
        return Err(Error::invalid(field, "must be positive"));
    }
    Ok(count)
}

fn positive_quantity(value: f64, field: &str) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::invalid(field, "must be a positive number"));
    }
    Ok(value)
}

/// Minimal structural email check; full address validation is not attempted.
pub fn validate_email(email: &str) -> Result<()> {
    let invalid = || Error::invalid("email", format!("'{email}' is not an email address"));
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

fn validate_method(
    method_number: Option<String>,
    revision_number: Option<i32>,
) -> Result<MethodRef> {
    Ok(MethodRef {
        method_number: required_text(method_number, "method_number")?,
        revision_number: revision_number.ok_or(Error::MissingField("revision_number"))?,
    })
}

impl ClientInfoDraft {
    pub fn validate(self) -> Result<IntakeHeader> {
        let email = required_text(self.email, "email")?;
        validate_email(&email)?;
        Ok(IntakeHeader {
            client: ClientIdentity {
                email,
                name: required_text(self.name, "name")?,
                company: required_text(self.company, "company")?,
            },
            sample_count: positive_count(self.sample_count, "sample_count")?,
            method: validate_method(self.method_number, self.revision_number)?,
            project_location: optional_text(self.project_location),
            sampled_by: optional_text(self.sampled_by),
            turnaround: optional_text(self.turnaround),
        })
    }
}

impl SampleDraft {
    /// Validate one sample. `index` is only used to name the offending sample.
    pub fn validate(self, index: usize) -> Result<NewSample> {
        let field = |name: &str| format!("samples[{index}].{name}");

        let label = required_text(self.label, "label")
            .map_err(|_| Error::invalid(field("label"), "is required"))?;
        let raw_date = required_text(self.sample_date, "sample_date")
            .map_err(|_| Error::invalid(field("sample_date"), "is required"))?;
        let sample_date = parse_calendar_date(&raw_date)?;

        let measurement = match (self.air_volume, self.surface_area) {
            (Some(volume), None) => {
                Measurement::AirVolume(positive_quantity(volume, &field("air_volume"))?)
            }
            (None, Some(area)) => {
                Measurement::SurfaceArea(positive_quantity(area, &field("surface_area"))?)
            }
            (Some(_), Some(_)) => {
                return Err(Error::invalid(
                    field("measurement"),
                    "air_volume and surface_area are mutually exclusive",
                ));
            }
            (None, None) => {
                return Err(Error::invalid(
                    field("measurement"),
                    "one of air_volume or surface_area is required",
                ));
            }
        };

        let mass = match self.mass {
            Some(m) if !m.is_finite() || m < 0.0 => {
                return Err(Error::invalid(field("mass"), "must be a non-negative number"));
            }
            other => other,
        };

        Ok(NewSample {
            label,
            sample_date,
            mass,
            measurement,
        })
    }
}

impl SubmissionDraft {
    /// Validate the header and every sample. Fails on the first problem found.
    pub fn validate(self) -> Result<Submission> {
        let header = self
            .client_info
            .ok_or(Error::MissingField("client_info"))?
            .validate()?;
        let samples = self
            .samples
            .ok_or(Error::MissingField("samples"))?
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.validate(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Submission { header, samples })
    }
}

impl ProjectDraft {
    pub fn validate(self) -> Result<NewProject> {
        Ok(NewProject {
            client_id: self.client_id.ok_or(Error::MissingField("client_id"))?,
            sample_count: positive_count(self.sample_count, "sample_count")?,
            method: validate_method(self.method_number, self.revision_number)?,
            due_date: parse_optional_date(self.due_date.as_deref())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn client_info() -> ClientInfoDraft {
        ClientInfoDraft {
            email: Some("a@x.com".to_string()),
            name: Some("A".to_string()),
            company: Some("Acme".to_string()),
            sample_count: Some(2),
            method_number: Some("OSHA 58".to_string()),
            revision_number: Some(1),
            ..Default::default()
        }
    }

    fn air_sample(label: &str) -> SampleDraft {
        SampleDraft {
            label: Some(label.to_string()),
            sample_date: Some("2024-05-01".to_string()),
            air_volume: Some(10.0),
            ..Default::default()
        }
    }

    #[test]
    fn valid_submission_keeps_sample_order() {
        let draft = SubmissionDraft {
            client_info: Some(client_info()),
            samples: Some(vec![
                air_sample("first"),
                SampleDraft {
                    label: Some("second".to_string()),
                    sample_date: Some("2024-05-02T08:00:00Z".to_string()),
                    surface_area: Some(5.0),
                    mass: Some(0.5),
                    ..Default::default()
                },
            ]),
        };

        let submission = draft.validate().unwrap();
        assert_eq!(submission.header.client.email, "a@x.com");
        assert_eq!(submission.samples.len(), 2);
        assert_eq!(submission.samples[0].label, "first");
        assert_eq!(
            submission.samples[0].measurement,
            Measurement::AirVolume(10.0)
        );
        assert_eq!(submission.samples[1].sample_date, date!(2024 - 05 - 02));
        assert_eq!(submission.samples[1].measurement.surface_area(), Some(5.0));
        assert_eq!(submission.samples[1].measurement.air_volume(), None);
    }

    #[test]
    fn rejects_both_measurements() {
        let mut sample = air_sample("both");
        sample.surface_area = Some(5.0);
        let err = sample.validate(3).unwrap_err();
        assert!(err.to_string().contains("samples[3].measurement"));
        assert!(err.is_validation());
    }

    #[test]
    fn rejects_missing_measurement() {
        let mut sample = air_sample("neither");
        sample.air_volume = None;
        assert!(sample.validate(0).is_err());
    }

    #[test]
    fn rejects_missing_label_and_date() {
        let mut sample = air_sample("x");
        sample.label = Some("   ".to_string());
        assert!(sample.validate(0).unwrap_err().to_string().contains("label"));

        let mut sample = air_sample("x");
        sample.sample_date = None;
        assert!(
            sample
                .validate(0)
                .unwrap_err()
                .to_string()
                .contains("sample_date")
        );
    }

    #[test]
    fn missing_header_fields_are_named() {
        let mut info = client_info();
        info.company = None;
        assert_eq!(info.validate().unwrap_err(), Error::MissingField("company"));

        let mut info = client_info();
        info.revision_number = None;
        assert_eq!(
            info.validate().unwrap_err(),
            Error::MissingField("revision_number")
        );

        let draft = SubmissionDraft::default();
        assert_eq!(
            draft.validate().unwrap_err(),
            Error::MissingField("client_info")
        );
    }

    #[test]
    fn rejects_non_positive_sample_count() {
        let mut info = client_info();
        info.sample_count = Some(0);
        assert!(info.validate().is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("lab@example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.org").is_err());
        assert!(validate_email("a@b@example.org").is_err());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("a b@example.org").is_err());
    }

    #[test]
    fn project_draft_parses_optional_due_date() {
        let draft = ProjectDraft {
            client_id: Some(7),
            sample_count: Some(3),
            method_number: Some("NIOSH 7300".to_string()),
            revision_number: Some(2),
            due_date: Some("2024-06-30".to_string()),
        };
        let project = draft.validate().unwrap();
        assert_eq!(project.due_date, Some(date!(2024 - 06 - 30)));

        let draft = ProjectDraft {
            client_id: None,
            ..Default::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            Error::MissingField("client_id")
        );
    }

    #[test]
    fn submission_without_samples_key_is_missing_field() {
        let draft: SubmissionDraft = serde_json::from_str(
            r#"{"client_info": {"email": "a@x.com", "name": "A", "company": "Acme",
                                "sample_count": 1, "method_number": "OSHA 58", "revision_number": 1}}"#,
        )
        .unwrap();
        assert_eq!(draft.validate().unwrap_err(), Error::MissingField("samples"));
    }

    #[test]
    fn drafts_deserialize_from_wire_json() {
        let draft: SubmissionDraft = serde_json::from_str(
            r#"{
                "client_info": {"email": "a@x.com", "name": "A", "company": "Acme",
                                "sample_count": 1, "method_number": "OSHA 58", "revision_number": 1},
                "samples": [{"label": "S1", "sample_date": "2024-01-01", "air_volume": 12.5}]
            }"#,
        )
        .unwrap();
        assert!(draft.validate().is_ok());
    }
}
