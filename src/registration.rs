//! Server-side registration rules shared by the individual, bulk and admin
//! entry points.

use crate::booking::is_valid_email;
use crate::db::participants::{self, RegistrationRecord};
use crate::db::users::{self, NewUser};
use crate::error::AppError;
use crate::models::{Participant, User};
use crate::pricing::{AddOns, Package, compute_total_price};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

const PLACEHOLDER_DOMAIN: &str = "no-email.festival.local";
const SUFFIX_ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Resolves a package id plus ticked add-ons into what gets stored, and
/// checks a client-quoted price against the computed one.
pub fn price_selection(
    package_type: Option<&str>,
    selected: AddOns,
    quoted: Option<u32>,
) -> Result<(Package, AddOns, u32), AppError> {
    let package_type = package_type
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::validation("Package is required"))?;
    let package: Package = package_type
        .parse()
        .map_err(|e: crate::pricing::UnknownPackage| AppError::validation(e.to_string()))?;
    let total = compute_total_price(package, selected);
    if let Some(quoted) = quoted {
        if quoted != total {
            return Err(AppError::validation(format!(
                "Price mismatch for {package}: expected {total}, got {quoted}"
            )));
        }
    }
    Ok((package, package.effective_add_ons(selected), total))
}

/// Whether `caller` may delete or restore `participant`: the registrant
/// themselves, whoever registered them, or an admin.
pub fn can_manage(caller: &User, participant: &Participant) -> bool {
    caller.is_admin
        || participant.user_id == caller.id
        || participant.registered_by == Some(caller.id)
}

/// Rejects when registration is closed, unless the caller is an admin.
pub async fn ensure_open(state: &AppState, is_admin: bool) -> Result<(), AppError> {
    let settings = state.settings.get().await?;
    if !settings.registration_open && !is_admin {
        return Err(AppError::RegistrationClosed(settings.registration_message));
    }
    Ok(())
}

fn required(value: &str, message: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::validation(message))
    } else {
        Ok(value.to_string())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub registrant_first_name: String,
    #[serde(default)]
    pub registrant_last_name: String,
    pub package_type: Option<String>,
    #[serde(default)]
    pub guinness_record_attempt: bool,
    #[serde(default)]
    pub greek_night: bool,
    pub total_price: Option<u32>,
}

pub async fn register_individual(
    state: &AppState,
    user: &User,
    req: RegisterRequest,
) -> Result<Participant, AppError> {
    ensure_open(state, user.is_admin).await?;

    let first_name = required(&req.registrant_first_name, "First name is required")?;
    let last_name = required(&req.registrant_last_name, "Last name is required")?;
    let phone = required(&req.phone, "Phone number is required")?;
    let (package, add_ons, total_price) = price_selection(
        req.package_type.as_deref(),
        AddOns::new(req.guinness_record_attempt, req.greek_night),
        req.total_price,
    )?;

    let mut conn = state.pool.acquire().await?;
    let participant = participants::register(
        &mut conn,
        &RegistrationRecord {
            user_id: user.id,
            first_name,
            last_name,
            phone: Some(phone),
            package,
            add_ons,
            total_price,
            registered_by: None,
        },
    )
    .await
    .map_err(|e| match e {
        AppError::Conflict(_) => AppError::conflict("You are already registered"),
        other => other,
    })?;

    tracing::info!(
        participant_id = participant.id,
        user_id = user.id,
        package = %package,
        total_price,
        "registration created"
    );
    Ok(participant)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrantType {
    Teacher,
    Studio,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStudent {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub package_type: Option<String>,
    #[serde(default)]
    pub guinness_record_attempt: bool,
    #[serde(default)]
    pub greek_night: bool,
    pub total_price: Option<u32>,
}

impl BulkStudent {
    fn label(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            "Unnamed student".to_string()
        } else {
            name.to_string()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    #[serde(default)]
    pub students: Vec<BulkStudent>,
    pub registrant_type: RegistrantType,
    pub studio_name: Option<String>,
    #[serde(default)]
    pub teacher_email: String,
    #[serde(default)]
    pub teacher_first_name: String,
    #[serde(default)]
    pub teacher_last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRegistered {
    pub participant_id: i64,
    pub name: String,
    pub email: String,
    pub package_type: Package,
    pub total_price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub student: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkOutcome {
    pub registered: Vec<BulkRegistered>,
    pub errors: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn succeeded(&self) -> bool {
        !self.registered.is_empty()
    }
}

/// Unique stand-in address for a student registered without one, so the
/// account's unique email constraint still holds.
pub fn placeholder_email(first_name: &str, last_name: &str, now: DateTime<Utc>) -> String {
    let slug = |s: &str| -> String {
        s.chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase()
    };
    let mut name = [slug(first_name), slug(last_name)]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".");
    if name.is_empty() {
        name.push_str("student");
    }
    format!(
        "{name}.{}.{}@{PLACEHOLDER_DOMAIN}",
        now.timestamp_millis(),
        nanoid!(6, &SUFFIX_ALPHABET)
    )
}

/// The account and registration details the caller is registering someone
/// else under: a bulk student or an admin-created entry.
#[derive(Debug, Clone)]
pub struct OnBehalfRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub package: Package,
    pub add_ons: AddOns,
    pub total_price: u32,
}

impl OnBehalfRegistration {
    pub fn from_student(student: BulkStudent) -> Result<Self, AppError> {
        let first_name = required(&student.first_name, "First name is required")?;
        let last_name = required(&student.last_name, "Last name is required")?;
        if student.total_price.is_none() {
            return Err(AppError::validation("Total price is required"));
        }
        let (package, add_ons, total_price) = price_selection(
            student.package_type.as_deref(),
            AddOns::new(student.guinness_record_attempt, student.greek_night),
            student.total_price,
        )?;
        let email = optional(student.email);
        if let Some(email) = &email {
            if !is_valid_email(email) {
                return Err(AppError::validation(format!("Invalid email address: {email}")));
            }
        }
        Ok(Self {
            first_name,
            last_name,
            email,
            phone: optional(student.phone),
            package,
            add_ons,
            total_price,
        })
    }
}

/// Looks up or creates the registrant's account and registers it, all in
/// one transaction.
pub async fn register_on_behalf(
    state: &AppState,
    registrar: &User,
    entry: OnBehalfRegistration,
) -> Result<(Participant, String), AppError> {
    let email = entry
        .email
        .clone()
        .unwrap_or_else(|| placeholder_email(&entry.first_name, &entry.last_name, Utc::now()));
    let full_name = format!("{} {}", entry.first_name, entry.last_name);

    let mut tx = state.pool.begin().await?;
    let user = match users::find_by_email(&mut *tx, &email).await? {
        Some(user) => user,
        None => users::create(&mut *tx, NewUser::without_password(&email, &full_name)).await?,
    };
    let participant = participants::register(
        &mut tx,
        &RegistrationRecord {
            user_id: user.id,
            first_name: entry.first_name,
            last_name: entry.last_name,
            phone: entry.phone,
            package: entry.package,
            add_ons: entry.add_ons,
            total_price: entry.total_price,
            registered_by: Some(registrar.id),
        },
    )
    .await?;
    tx.commit().await?;
    Ok((participant, user.email))
}

pub async fn register_bulk(
    state: &AppState,
    caller_is_admin: bool,
    req: BulkRequest,
) -> Result<BulkOutcome, AppError> {
    ensure_open(state, caller_is_admin).await?;

    let teacher_email = users::normalize_email(&req.teacher_email);
    if !is_valid_email(&teacher_email) {
        return Err(AppError::validation("A valid contact email is required"));
    }
    let first = required(&req.teacher_first_name, "Contact first name is required")?;
    let last = required(&req.teacher_last_name, "Contact last name is required")?;
    let studio_name = optional(req.studio_name);
    if req.registrant_type == RegistrantType::Studio && studio_name.is_none() {
        return Err(AppError::validation("Studio name is required"));
    }
    if req.students.is_empty() {
        return Err(AppError::validation("At least one student is required"));
    }

    let registrar = {
        let mut tx = state.pool.begin().await?;
        let registrar = users::upsert_registrar(
            &mut tx,
            &teacher_email,
            &format!("{first} {last}"),
            req.registrant_type == RegistrantType::Teacher,
            studio_name.as_deref(),
        )
        .await?;
        tx.commit().await?;
        registrar
    };

    let mut outcome = BulkOutcome::default();
    for student in req.students {
        let label = student.label();
        let result = match OnBehalfRegistration::from_student(student) {
            Ok(entry) => register_on_behalf(state, &registrar, entry).await,
            Err(e) => Err(e),
        };
        match result {
            Ok((participant, email)) => outcome.registered.push(BulkRegistered {
                participant_id: participant.id,
                name: participant.display_name(),
                email,
                package_type: participant.package_type,
                total_price: participant.total_price,
            }),
            Err(e) => {
                let error = match e {
                    AppError::Conflict(_) => "Already registered".to_string(),
                    AppError::Database(_) | AppError::Internal(_) => {
                        tracing::error!(student = %label, error = %e, "bulk registration failed");
                        "Could not register this student".to_string()
                    }
                    other => other.to_string(),
                };
                outcome.errors.push(BulkFailure {
                    student: label,
                    error,
                });
            }
        }
    }

    tracing::info!(
        registrar_id = registrar.id,
        registered = outcome.registered.len(),
        failed = outcome.errors.len(),
        "bulk registration processed"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_price_must_match() {
        let (package, add_ons, total) =
            price_selection(Some("starter-pass"), AddOns::new(true, true), Some(140)).unwrap();
        assert_eq!(package, Package::StarterPass);
        assert_eq!(add_ons, AddOns::new(true, true));
        assert_eq!(total, 140);

        assert!(price_selection(Some("starter-pass"), AddOns::NONE, Some(90)).is_err());
        assert!(price_selection(None, AddOns::NONE, None).is_err());
        assert!(price_selection(Some("gold-pass"), AddOns::NONE, None).is_err());
    }

    #[test]
    fn full_pass_stores_both_addons() {
        let (_, add_ons, total) = price_selection(Some("full-pass"), AddOns::NONE, None).unwrap();
        assert_eq!(add_ons, AddOns::new(true, true));
        assert_eq!(total, 260);
    }

    #[test]
    fn placeholder_emails_are_unique_and_recognisable() {
        let now = Utc::now();
        let a = placeholder_email("Maria", "Papadopoulou", now);
        let b = placeholder_email("Maria", "Papadopoulou", now);
        assert_ne!(a, b);
        assert!(a.starts_with("maria.papadopoulou."));
        assert!(a.ends_with("@no-email.festival.local"));
        assert!(is_valid_email(&a));
        assert!(placeholder_email("Ελένη", "", now).starts_with("student."));
    }

    #[test]
    fn student_needs_names_package_and_price() {
        let student = BulkStudent {
            first_name: "Anna".into(),
            last_name: "K".into(),
            package_type: Some("explorer-pass".into()),
            total_price: None,
            ..BulkStudent::default()
        };
        assert!(OnBehalfRegistration::from_student(student.clone()).is_err());

        let ok = OnBehalfRegistration::from_student(BulkStudent {
            total_price: Some(100),
            ..student
        })
        .unwrap();
        assert_eq!(ok.package, Package::ExplorerPass);
        assert!(ok.email.is_none());
    }

    fn user(id: i64, is_admin: bool) -> User {
        User {
            id,
            email: format!("u{id}@example.com"),
            name: "U".into(),
            password_hash: None,
            is_admin,
            is_teacher: false,
            studio_name: None,
            email_verified_at: None,
            created_at: Utc::now(),
        }
    }

    fn participant(user_id: i64, registered_by: Option<i64>) -> Participant {
        Participant {
            id: 1,
            user_id,
            registrant_first_name: "A".into(),
            registrant_last_name: "B".into(),
            phone: None,
            package_type: Package::StarterPass,
            guinness_record_attempt: false,
            greek_night: false,
            total_price: 70,
            checked_in: false,
            registered_by,
            deleted_at: None,
            deleted_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn owner_registrar_and_admin_may_manage() {
        let p = participant(1, Some(2));
        assert!(can_manage(&user(1, false), &p));
        assert!(can_manage(&user(2, false), &p));
        assert!(can_manage(&user(9, true), &p));
        assert!(!can_manage(&user(3, false), &p));
    }
}
