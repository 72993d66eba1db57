use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::schema::{Category, FieldValue, ListConfig, Record};
use crate::session::{Role, ViewKind};

/// Someone the NGO supports, child or elderly
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: u64,
    pub full_name: Option<String>,
    pub guardian_id: Option<u64>,
    pub guardian_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub status: Option<BeneficiaryStatus>,
    #[serde(rename = "type")]
    pub beneficiary_type: Option<BeneficiaryType>,
    pub sponsor_name: Option<String>,
    pub registered_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneficiaryStatus {
    Active,
    WaitingList,
    PendingReassignment,
    Terminated,
    Graduated,
    #[serde(other)]
    Unknown,
}

impl BeneficiaryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BeneficiaryStatus::Active => "active",
            BeneficiaryStatus::WaitingList => "waiting_list",
            BeneficiaryStatus::PendingReassignment => "pending_reassignment",
            BeneficiaryStatus::Terminated => "terminated",
            BeneficiaryStatus::Graduated => "graduated",
            BeneficiaryStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneficiaryType {
    Child,
    Elderly,
    #[serde(other)]
    Unknown,
}

impl BeneficiaryType {
    pub fn as_str(self) -> &'static str {
        match self {
            BeneficiaryType::Child => "child",
            BeneficiaryType::Elderly => "elderly",
            BeneficiaryType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[serde(other)]
    Unknown,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

fn beneficiary_name(b: &Beneficiary) -> FieldValue<'_> {
    FieldValue::text(b.full_name.as_deref())
}
fn beneficiary_guardian(b: &Beneficiary) -> FieldValue<'_> {
    FieldValue::text(b.guardian_name.as_deref())
}
fn beneficiary_guardian_id(b: &Beneficiary) -> FieldValue<'_> {
    FieldValue::number(b.guardian_id.map(|id| id as f64))
}
fn beneficiary_age(b: &Beneficiary) -> FieldValue<'_> {
    FieldValue::number(b.age)
}
fn beneficiary_gender(b: &Beneficiary) -> FieldValue<'_> {
    FieldValue::text(b.gender.map(Gender::as_str))
}
fn beneficiary_phone(b: &Beneficiary) -> FieldValue<'_> {
    FieldValue::text(b.phone.as_deref())
}
fn beneficiary_status(b: &Beneficiary) -> FieldValue<'_> {
    FieldValue::text(b.status.map(BeneficiaryStatus::as_str))
}
fn beneficiary_type(b: &Beneficiary) -> FieldValue<'_> {
    FieldValue::text(b.beneficiary_type.map(BeneficiaryType::as_str))
}
fn beneficiary_sponsor(b: &Beneficiary) -> FieldValue<'_> {
    FieldValue::text(b.sponsor_name.as_deref())
}

/// Children per guardian at which a family counts as large
pub const LARGE_FAMILY_SIZE: usize = 10;

impl Record for Beneficiary {
    const COLLECTION: &'static str = "beneficiaries";
    const KIND: ViewKind = ViewKind::Beneficiaries;

    fn id(&self) -> u64 {
        self.id
    }

    fn display_name(&self) -> Cow<'_, str> {
        display_or_id(self.full_name.as_deref(), self.id)
    }

    fn contact_phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    fn list_config() -> ListConfig<Self> {
        ListConfig::new()
            .column("full_name", "Name", beneficiary_name)
            .column("guardian_name", "Guardian", beneficiary_guardian)
            .column("age", "Age", beneficiary_age)
            .column("gender", "Gender", beneficiary_gender)
            .column("phone", "Phone", beneficiary_phone)
            .column("status", "Status", beneficiary_status)
            .column("type", "Type", beneficiary_type)
            .column("sponsor_name", "Sponsor", beneficiary_sponsor)
            .search(beneficiary_name)
            .search(beneficiary_guardian)
            .search(beneficiary_phone)
            .category(Category::equals("active", "Active", beneficiary_status))
            .category(Category::equals("waiting_list", "Waiting List", beneficiary_status))
            .category(Category::equals(
                "pending_reassignment",
                "Pending Reassignment",
                beneficiary_status,
            ))
            .category(Category::equals("terminated", "Terminated", beneficiary_status))
            .category(Category::equals("graduated", "Graduated", beneficiary_status))
            .category(Category::equals("child", "Children", beneficiary_type))
            .category(Category::equals("elderly", "Elderly", beneficiary_type))
            .category(Category::group_size_at_least(
                "large_family",
                "Guardians with 10+ children",
                beneficiary_guardian_id,
                LARGE_FAMILY_SIZE,
            ))
            .partition(beneficiary_status)
            .aliases(&[
                ("waiting", "waiting_list"),
                ("reassign", "pending_reassignment"),
                ("children", "child"),
                ("elders", "elderly"),
                ("large", "large_family"),
            ])
    }
}

/// An individual or organization funding beneficiaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sponsor {
    pub id: u64,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: Option<SponsorStatus>,
    #[serde(rename = "type")]
    pub sponsor_type: Option<SponsorType>,
    pub beneficiary_count: Option<u32>,
    pub monthly_amount: Option<f64>,
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SponsorStatus {
    Active,
    Inactive,
    Pending,
    #[serde(other)]
    Unknown,
}

impl SponsorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SponsorStatus::Active => "active",
            SponsorStatus::Inactive => "inactive",
            SponsorStatus::Pending => "pending",
            SponsorStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SponsorType {
    Individual,
    Organization,
    #[serde(other)]
    Unknown,
}

impl SponsorType {
    pub fn as_str(self) -> &'static str {
        match self {
            SponsorType::Individual => "individual",
            SponsorType::Organization => "organization",
            SponsorType::Unknown => "unknown",
        }
    }
}

fn sponsor_name(s: &Sponsor) -> FieldValue<'_> {
    FieldValue::text(s.full_name.as_deref())
}
fn sponsor_phone(s: &Sponsor) -> FieldValue<'_> {
    FieldValue::text(s.phone.as_deref())
}
fn sponsor_email(s: &Sponsor) -> FieldValue<'_> {
    FieldValue::text(s.email.as_deref())
}
fn sponsor_status(s: &Sponsor) -> FieldValue<'_> {
    FieldValue::text(s.status.map(SponsorStatus::as_str))
}
fn sponsor_type(s: &Sponsor) -> FieldValue<'_> {
    FieldValue::text(s.sponsor_type.map(SponsorType::as_str))
}
fn sponsor_beneficiaries(s: &Sponsor) -> FieldValue<'_> {
    FieldValue::number(s.beneficiary_count)
}

impl Record for Sponsor {
    const COLLECTION: &'static str = "sponsors";
    const KIND: ViewKind = ViewKind::Sponsors;

    fn id(&self) -> u64 {
        self.id
    }

    fn display_name(&self) -> Cow<'_, str> {
        display_or_id(self.full_name.as_deref(), self.id)
    }

    fn contact_phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    fn list_config() -> ListConfig<Self> {
        ListConfig::new()
            .column("full_name", "Name", sponsor_name)
            .column("phone", "Phone", sponsor_phone)
            .column("email", "Email", sponsor_email)
            .column("status", "Status", sponsor_status)
            .column("type", "Type", sponsor_type)
            .column("beneficiary_count", "Beneficiaries", sponsor_beneficiaries)
            .search(sponsor_name)
            .search(sponsor_phone)
            .search(sponsor_email)
            .category(Category::equals("active", "Active", sponsor_status))
            .category(Category::equals("inactive", "Inactive", sponsor_status))
            .category(Category::equals("pending", "Pending", sponsor_status))
            .category(Category::equals("individual", "Individuals", sponsor_type))
            .category(Category::equals("organization", "Organizations", sponsor_type))
            .category(Category::at_least("multi", "Sponsoring 3+", sponsor_beneficiaries, 3.0))
            .partition(sponsor_status)
            .aliases(&[("new", "pending"), ("orgs", "organization")])
    }
}

/// The adult responsible for one or more child beneficiaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guardian {
    pub id: u64,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub relation: Option<String>,
    pub address: Option<String>,
    pub children_count: Option<u32>,
}

fn guardian_name(g: &Guardian) -> FieldValue<'_> {
    FieldValue::text(g.full_name.as_deref())
}
fn guardian_phone(g: &Guardian) -> FieldValue<'_> {
    FieldValue::text(g.phone.as_deref())
}
fn guardian_relation(g: &Guardian) -> FieldValue<'_> {
    FieldValue::text(g.relation.as_deref())
}
fn guardian_address(g: &Guardian) -> FieldValue<'_> {
    FieldValue::text(g.address.as_deref())
}
fn guardian_children(g: &Guardian) -> FieldValue<'_> {
    FieldValue::number(g.children_count)
}

impl Record for Guardian {
    const COLLECTION: &'static str = "guardians";
    const KIND: ViewKind = ViewKind::Guardians;

    fn id(&self) -> u64 {
        self.id
    }

    fn display_name(&self) -> Cow<'_, str> {
        display_or_id(self.full_name.as_deref(), self.id)
    }

    fn contact_phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    fn list_config() -> ListConfig<Self> {
        ListConfig::new()
            .column("full_name", "Name", guardian_name)
            .column("phone", "Phone", guardian_phone)
            .column("relation", "Relation", guardian_relation)
            .column("address", "Address", guardian_address)
            .column("children_count", "Children", guardian_children)
            .search(guardian_name)
            .search(guardian_phone)
            .search(guardian_address)
            .category(Category::at_least(
                "ten_plus",
                "10+ children",
                guardian_children,
                LARGE_FAMILY_SIZE as f64,
            ))
            .partition(guardian_relation)
            .aliases(&[("large", "ten_plus")])
    }
}

/// Staff account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: u64,
    #[serde(rename = "employeeName")]
    pub employee_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub access_level: Option<Role>,
}

fn employee_name(e: &Employee) -> FieldValue<'_> {
    FieldValue::text(e.employee_name.as_deref())
}
fn employee_phone(e: &Employee) -> FieldValue<'_> {
    FieldValue::text(e.phone.as_deref())
}
fn employee_email(e: &Employee) -> FieldValue<'_> {
    FieldValue::text(e.email.as_deref())
}
fn employee_access(e: &Employee) -> FieldValue<'_> {
    FieldValue::text(e.access_level.map(Role::as_str))
}

impl Record for Employee {
    const COLLECTION: &'static str = "employees";
    const KIND: ViewKind = ViewKind::Employees;

    fn id(&self) -> u64 {
        self.id
    }

    fn display_name(&self) -> Cow<'_, str> {
        display_or_id(self.employee_name.as_deref(), self.id)
    }

    fn contact_phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    fn list_config() -> ListConfig<Self> {
        ListConfig::new()
            .column("employee_name", "Name", employee_name)
            .column("phone", "Phone", employee_phone)
            .column("email", "Email", employee_email)
            .column("access_level", "Access", employee_access)
            .search(employee_name)
            .search(employee_phone)
            .search(employee_email)
            .category(Category::equals("admin", "Admins", employee_access))
            .category(Category::equals("manager", "Managers", employee_access))
            .category(Category::equals("staff", "Staff", employee_access))
            .partition(employee_access)
    }
}

/// A request to register, reassign or terminate a beneficiary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryRequest {
    pub id: u64,
    pub full_name: Option<String>,
    pub requested_by: Option<String>,
    pub phone: Option<String>,
    pub status: Option<RequestStatus>,
    #[serde(rename = "type")]
    pub request_type: Option<RequestType>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    NewRegistration,
    Reassignment,
    Termination,
    #[serde(other)]
    Unknown,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::NewRegistration => "new_registration",
            RequestType::Reassignment => "reassignment",
            RequestType::Termination => "termination",
            RequestType::Unknown => "unknown",
        }
    }
}

fn request_name(r: &BeneficiaryRequest) -> FieldValue<'_> {
    FieldValue::text(r.full_name.as_deref())
}
fn request_requested_by(r: &BeneficiaryRequest) -> FieldValue<'_> {
    FieldValue::text(r.requested_by.as_deref())
}
fn request_phone(r: &BeneficiaryRequest) -> FieldValue<'_> {
    FieldValue::text(r.phone.as_deref())
}
fn request_status(r: &BeneficiaryRequest) -> FieldValue<'_> {
    FieldValue::text(r.status.map(RequestStatus::as_str))
}
fn request_type(r: &BeneficiaryRequest) -> FieldValue<'_> {
    FieldValue::text(r.request_type.map(RequestType::as_str))
}
fn request_created(r: &BeneficiaryRequest) -> FieldValue<'_> {
    FieldValue::text(r.created_at.as_deref())
}

impl Record for BeneficiaryRequest {
    const COLLECTION: &'static str = "requests";
    const KIND: ViewKind = ViewKind::Requests;

    fn id(&self) -> u64 {
        self.id
    }

    fn display_name(&self) -> Cow<'_, str> {
        display_or_id(self.full_name.as_deref(), self.id)
    }

    fn contact_phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    fn list_config() -> ListConfig<Self> {
        ListConfig::new()
            .column("full_name", "Name", request_name)
            .column("requested_by", "Requested By", request_requested_by)
            .column("phone", "Phone", request_phone)
            .column("status", "Status", request_status)
            .column("type", "Type", request_type)
            .column("created_at", "Submitted", request_created)
            .search(request_name)
            .search(request_requested_by)
            .search(request_phone)
            .category(Category::equals("pending", "Pending", request_status))
            .category(Category::equals("approved", "Approved", request_status))
            .category(Category::equals("rejected", "Rejected", request_status))
            .category(Category::equals("new_registration", "Registrations", request_type))
            .category(Category::equals("reassignment", "Reassignments", request_type))
            .category(Category::equals("termination", "Terminations", request_type))
            .partition(request_status)
            .aliases(&[("open", "pending"), ("reassign", "reassignment")])
    }
}

fn display_or_id(name: Option<&str>, id: u64) -> Cow<'_, str> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("#{}", id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beneficiary_tolerates_missing_and_unknown_fields() {
        let b: Beneficiary = serde_json::from_str(
            r#"{"id": 4, "status": "on_hold", "type": "child", "extra": true}"#,
        )
        .unwrap();

        assert_eq!(b.id, 4);
        assert_eq!(b.status, Some(BeneficiaryStatus::Unknown));
        assert_eq!(b.beneficiary_type, Some(BeneficiaryType::Child));
        assert_eq!(b.full_name, None);
        assert_eq!(b.display_name(), "#4");
    }

    #[test]
    fn test_employee_wire_name() {
        let e: Employee =
            serde_json::from_str(r#"{"id": 1, "employeeName": "Dawit", "access_level": "manager"}"#)
                .unwrap();
        assert_eq!(e.employee_name.as_deref(), Some("Dawit"));
        assert_eq!(e.access_level, Some(Role::Manager));
    }

    #[test]
    fn test_category_keys_resolve() {
        let config = Beneficiary::list_config();
        for category in &config.categories {
            assert!(config.find_category(category.key).is_some());
        }
        for (_, target) in config.view_aliases {
            assert!(config.find_category(target).is_some(), "alias target {} missing", target);
        }
    }
}
