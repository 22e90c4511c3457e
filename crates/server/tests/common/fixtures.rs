//! Test fixtures: a small reference catalog and intake builders.

use assay_core::{
    ClientIdentity, IntakeHeader, Measurement, MethodRef, NewProject, NewSample, Submission,
};
use assay_metadata::MetadataStore;
use assay_metadata::models::MethodRow;
use serde_json::{Value, json};
use time::Date;
use time::macros::date;

/// Method revision every fixture intake uses.
pub const LEAD_METHOD: &str = "OSHA ID-121";

/// Employee IDs created by [`seed_catalog`].
#[allow(dead_code)]
pub struct Catalog {
    pub chemist_id: i64,
    pub analyst_id: i64,
    pub reviewer_id: i64,
}

/// Insert methods for two compounds and three employees.
///
/// Lead has two revisions of one method plus an older method, so method
/// ordering is observable. The reviewer's role is not a chemist role.
#[allow(dead_code)]
pub async fn seed_catalog(store: &dyn MetadataStore) -> Catalog {
    let methods = [
        (LEAD_METHOD, 1, "Lead", Some(0.5), Some(1.0)),
        (LEAD_METHOD, 2, "Lead", Some(0.25), Some(1.0)),
        ("NIOSH 7082", 1, "Lead", Some(1.0), None),
        ("OSHA ID-125G", 1, "Beryllium", Some(0.02), Some(0.05)),
    ];
    for (number, revision, compound, air_loq, surface_loq) in methods {
        store
            .create_method(&MethodRow {
                method_number: number.to_string(),
                revision_number: revision,
                compound_name: compound.to_string(),
                air_loq,
                surface_loq,
            })
            .await
            .expect("Failed to create method");
    }

    let chemist_id = store
        .create_employee("Dana Whitfield", "Chemist")
        .await
        .expect("Failed to create chemist");
    let analyst_id = store
        .create_employee("Alex Moreno", "Analyst")
        .await
        .expect("Failed to create analyst");
    let reviewer_id = store
        .create_employee("Priya Natarajan", "QA Manager")
        .await
        .expect("Failed to create reviewer");

    Catalog {
        chemist_id,
        analyst_id,
        reviewer_id,
    }
}

#[allow(dead_code)]
pub fn client(email: &str, name: &str, company: &str) -> ClientIdentity {
    ClientIdentity {
        email: email.to_string(),
        name: name.to_string(),
        company: company.to_string(),
    }
}

#[allow(dead_code)]
pub fn header(client: ClientIdentity, sample_count: i32) -> IntakeHeader {
    IntakeHeader {
        client,
        sample_count,
        method: MethodRef {
            method_number: LEAD_METHOD.to_string(),
            revision_number: 1,
        },
        project_location: Some("Building 4".to_string()),
        sampled_by: Some("Field Tech".to_string()),
        turnaround: Some("5 day".to_string()),
    }
}

#[allow(dead_code)]
pub fn air_sample(label: &str, volume: f64) -> NewSample {
    NewSample {
        label: label.to_string(),
        sample_date: date!(2024 - 03 - 01),
        mass: None,
        measurement: Measurement::AirVolume(volume),
    }
}

#[allow(dead_code)]
pub fn surface_sample(label: &str, area: f64) -> NewSample {
    NewSample {
        label: label.to_string(),
        sample_date: date!(2024 - 03 - 02),
        mass: Some(0.1),
        measurement: Measurement::SurfaceArea(area),
    }
}

/// Submission for `email` with one air and one surface sample.
#[allow(dead_code)]
pub fn submission(email: &str, company: &str) -> Submission {
    Submission {
        header: header(client(email, "Contact", company), 2),
        samples: vec![air_sample("AIR-1", 10.0), surface_sample("WIPE-1", 5.0)],
    }
}

/// Sample-less project for an existing client.
#[allow(dead_code)]
pub fn new_project(client_id: i64, due_date: Option<Date>) -> NewProject {
    NewProject {
        client_id,
        sample_count: 3,
        method: MethodRef {
            method_number: LEAD_METHOD.to_string(),
            revision_number: 1,
        },
        due_date,
    }
}

/// Intake request body as a client would send it.
#[allow(dead_code)]
pub fn intake_body(email: &str, company: &str, samples: Value) -> Value {
    json!({
        "client_info": {
            "email": email,
            "name": "A",
            "company": company,
            "sample_count": 2,
            "method_number": LEAD_METHOD,
            "revision_number": 1,
            "project_location": "Building 4",
            "turnaround": "5 day"
        },
        "samples": samples
    })
}
