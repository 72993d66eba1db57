use caredesk_api::ApiClient;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::models::{
    Beneficiary, BeneficiaryStatus, BeneficiaryType, Employee, Gender, Guardian, Sponsor,
    SponsorStatus, SponsorType,
};
use crate::session::Role;
use crate::{Result, ValidationErrors};

/// Oldest age the registration form accepts
pub const MAX_AGE: u32 = 120;

/// A create/edit form for one collection
pub trait Form: Serialize + Send + Sync {
    const COLLECTION: &'static str;

    fn validate(&self) -> ValidationErrors;
}

/// Validate, then `POST /api/<collection>`
pub async fn submit_create<F, R>(client: &ApiClient, form: &F) -> Result<R>
where
    F: Form,
    R: DeserializeOwned,
{
    form.validate().into_result()?;
    debug!("Creating {} record", F::COLLECTION);
    let created = client.create(F::COLLECTION, form).await?;
    info!("Created {} record", F::COLLECTION);
    Ok(created)
}

/// Validate, then `PUT /api/<collection>/<id>`
pub async fn submit_update<F, R>(client: &ApiClient, id: u64, form: &F) -> Result<R>
where
    F: Form,
    R: DeserializeOwned,
{
    form.validate().into_result()?;
    debug!("Updating {} #{}", F::COLLECTION, id);
    let updated = client.update(F::COLLECTION, id, form).await?;
    info!("Updated {} #{}", F::COLLECTION, id);
    Ok(updated)
}

/// Strip the separators people type into phone numbers
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect()
}

/// Optional leading `+`, then 9 to 15 digits
pub fn is_valid_phone(raw: &str) -> bool {
    let phone = normalize_phone(raw.trim());
    let digits = phone.strip_prefix('+').unwrap_or(&phone);
    (9..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn is_valid_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !raw.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

fn required(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("{} is required", label));
    }
}

fn check_phone(errors: &mut ValidationErrors, value: Option<&str>, mandatory: bool) {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(phone) if !is_valid_phone(phone) => {
            errors.add("phone", "Enter a phone number with 9 to 15 digits")
        }
        Some(_) => {}
        None if mandatory => errors.add("phone", "Phone is required"),
        None => {}
    }
}

fn check_email(errors: &mut ValidationErrors, value: Option<&str>, mandatory: bool) {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(email) if !is_valid_email(email) => errors.add("email", "Enter a valid email address"),
        Some(_) => {}
        None if mandatory => errors.add("email", "Email is required"),
        None => {}
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BeneficiaryForm {
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub beneficiary_type: Option<BeneficiaryType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BeneficiaryStatus>,
}

impl Form for BeneficiaryForm {
    const COLLECTION: &'static str = "beneficiaries";

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "full_name", "Full name", &self.full_name);

        match self.beneficiary_type {
            None | Some(BeneficiaryType::Unknown) => {
                errors.add("type", "Choose child or elderly");
            }
            // children are registered under a guardian
            Some(BeneficiaryType::Child) if self.guardian_id.is_none() => {
                errors.add("guardian_id", "A child needs a guardian");
            }
            Some(_) => {}
        }

        if matches!(self.age, Some(age) if age > MAX_AGE) {
            errors.add("age", format!("Age must be at most {}", MAX_AGE));
        }
        check_phone(&mut errors, self.phone.as_deref(), false);
        errors
    }
}

impl From<&Beneficiary> for BeneficiaryForm {
    fn from(b: &Beneficiary) -> Self {
        Self {
            full_name: b.full_name.clone().unwrap_or_default(),
            guardian_id: b.guardian_id,
            age: b.age,
            gender: b.gender,
            phone: b.phone.clone(),
            beneficiary_type: b.beneficiary_type,
            status: b.status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SponsorForm {
    pub full_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub sponsor_type: Option<SponsorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SponsorStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_amount: Option<f64>,
    /// `YYYY-MM-DD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

impl Form for SponsorForm {
    const COLLECTION: &'static str = "sponsors";

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "full_name", "Full name", &self.full_name);
        check_phone(&mut errors, Some(&self.phone), true);
        check_email(&mut errors, self.email.as_deref(), false);

        if matches!(self.sponsor_type, None | Some(SponsorType::Unknown)) {
            errors.add("type", "Choose individual or organization");
        }
        if let Some(amount) = self.monthly_amount {
            if !amount.is_finite() || amount <= 0.0 {
                errors.add("monthly_amount", "Monthly amount must be greater than zero");
            }
        }
        if let Some(date) = self.start_date.as_deref().filter(|d| !d.trim().is_empty()) {
            if NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").is_err() {
                errors.add("start_date", "Use the YYYY-MM-DD format");
            }
        }
        errors
    }
}

impl From<&Sponsor> for SponsorForm {
    fn from(s: &Sponsor) -> Self {
        Self {
            full_name: s.full_name.clone().unwrap_or_default(),
            phone: s.phone.clone().unwrap_or_default(),
            email: s.email.clone(),
            sponsor_type: s.sponsor_type,
            status: s.status,
            monthly_amount: s.monthly_amount,
            start_date: s.start_date.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuardianForm {
    pub full_name: String,
    pub phone: String,
    pub relation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Form for GuardianForm {
    const COLLECTION: &'static str = "guardians";

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "full_name", "Full name", &self.full_name);
        check_phone(&mut errors, Some(&self.phone), true);
        required(&mut errors, "relation", "Relation", &self.relation);
        errors
    }
}

impl From<&Guardian> for GuardianForm {
    fn from(g: &Guardian) -> Self {
        Self {
            full_name: g.full_name.clone().unwrap_or_default(),
            phone: g.phone.clone().unwrap_or_default(),
            relation: g.relation.clone().unwrap_or_default(),
            address: g.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeForm {
    #[serde(rename = "employeeName")]
    pub employee_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<Role>,
    /// Only sent when creating an account or resetting its password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Form for EmployeeForm {
    const COLLECTION: &'static str = "employees";

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        required(&mut errors, "employeeName", "Employee name", &self.employee_name);
        check_email(&mut errors, Some(&self.email), true);
        check_phone(&mut errors, self.phone.as_deref(), false);

        if matches!(self.access_level, None | Some(Role::Unknown)) {
            errors.add("access_level", "Choose admin, manager or staff");
        }
        if matches!(&self.password, Some(p) if p.chars().count() < 8) {
            errors.add("password", "Password must be at least 8 characters");
        }
        errors
    }
}

impl From<&Employee> for EmployeeForm {
    fn from(e: &Employee) -> Self {
        Self {
            employee_name: e.employee_name.clone().unwrap_or_default(),
            email: e.email.clone().unwrap_or_default(),
            phone: e.phone.clone(),
            access_level: e.access_level,
            password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn guardian_form() -> GuardianForm {
        GuardianForm {
            full_name: "Almaz Tesfaye".into(),
            phone: "+251 911-234-567".into(),
            relation: "mother".into(),
            address: None,
        }
    }

    #[test]
    fn test_phone_shapes() {
        assert!(is_valid_phone("0911234567"));
        assert!(is_valid_phone("+251 911 234 567"));
        assert!(is_valid_phone("(011) 123-4567"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("0911-abc-567"));
        assert!(!is_valid_phone("++251911234567"));
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("staff@ngo.org"));
        assert!(!is_valid_email("staff@ngo"));
        assert!(!is_valid_email("@ngo.org"));
        assert!(!is_valid_email("staff@@ngo.org"));
        assert!(!is_valid_email("st aff@ngo.org"));
        assert!(!is_valid_email("staff@ngo..org"));
    }

    #[test]
    fn test_child_needs_guardian() {
        let form = BeneficiaryForm {
            full_name: "Yonas".into(),
            beneficiary_type: Some(BeneficiaryType::Child),
            age: Some(130),
            ..BeneficiaryForm::default()
        };
        let errors = form.validate();
        assert!(errors.get("guardian_id").is_some());
        assert!(errors.get("age").is_some());
        assert!(errors.get("full_name").is_none());

        let elderly = BeneficiaryForm {
            full_name: "Yonas".into(),
            beneficiary_type: Some(BeneficiaryType::Elderly),
            ..BeneficiaryForm::default()
        };
        assert!(elderly.validate().is_empty());
    }

    #[test]
    fn test_sponsor_checks() {
        let form = SponsorForm {
            full_name: " ".into(),
            phone: "0911234567".into(),
            email: Some("nope".into()),
            sponsor_type: Some(SponsorType::Individual),
            monthly_amount: Some(0.0),
            start_date: Some("2024/01/01".into()),
            ..SponsorForm::default()
        };
        let errors = form.validate();
        let fields: Vec<&str> = errors.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["email", "full_name", "monthly_amount", "start_date"]);
    }

    #[test]
    fn test_employee_wire_shape() {
        let form = EmployeeForm {
            employee_name: "Dawit".into(),
            email: "dawit@ngo.org".into(),
            access_level: Some(Role::Staff),
            ..EmployeeForm::default()
        };
        assert!(form.validate().is_empty());
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({"employeeName": "Dawit", "email": "dawit@ngo.org", "access_level": "staff"})
        );
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let form = GuardianForm {
            phone: "12".into(),
            ..guardian_form()
        };

        let result: Result<Guardian> = submit_create(&client, &form).await;
        match result {
            Err(Error::Validation(errors)) => {
                assert_eq!(errors.get("phone"), Some("Enter a phone number with 9 to 15 digits"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_valid_form_is_submitted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/guardians"))
            .and(body_json(json!({
                "full_name": "Almaz Tesfaye",
                "phone": "+251 911-234-567",
                "relation": "mother"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 12,
                "full_name": "Almaz Tesfaye",
                "relation": "mother"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let created: Guardian = submit_create(&client, &guardian_form()).await.unwrap();
        assert_eq!(created.id, 12);
    }

    #[tokio::test]
    async fn test_update_uses_record_id() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/guardians/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(server.uri()).unwrap();
        let record = Guardian {
            id: 12,
            full_name: Some("Almaz".into()),
            phone: Some("0911234567".into()),
            relation: Some("aunt".into()),
            ..Guardian::default()
        };
        let updated: Guardian = submit_update(&client, record.id, &GuardianForm::from(&record))
            .await
            .unwrap();
        assert_eq!(updated.id, 12);
    }
}
