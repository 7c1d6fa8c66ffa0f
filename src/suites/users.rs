//! Contract tests for the `users` resource.

use std::time::Duration;

use chrono::{Datelike, Local};
use serde_json::Value;
use tracing::{debug, info};

use crate::http::HttpResponse;
use crate::testing::assertions::json_kind;
use crate::testing::{
    AssertionFailure, AssertionTarget, ResponseExpectation, TestCase, TestContext, TestError,
    TestResult, ensure, ensure_status_in, test_fn, validate_api_response,
};

use super::fake;

const MODULE: &str = "users";

/// Keys every listed user must carry.
const USER_KEYS: [&str; 6] = ["id", "name", "username", "phone", "address", "website"];

/// Id that the service never hands out.
const MISSING_USER_ID: u32 = 99_999;

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase {
            module: MODULE,
            suite: "GetUser",
            name: "get_response_code",
            marks: &["get"],
            run: test_fn!(get_response_code),
        },
        TestCase {
            module: MODULE,
            suite: "GetUser",
            name: "get_response_data",
            marks: &["get"],
            run: test_fn!(get_response_data),
        },
        TestCase {
            module: MODULE,
            suite: "PostUser",
            name: "post_response_code",
            marks: &["post"],
            run: test_fn!(post_response_code),
        },
        TestCase {
            module: MODULE,
            suite: "UserWorkflow",
            name: "full_lifecycle",
            marks: &["workflow"],
            run: test_fn!(full_lifecycle),
        },
        TestCase {
            module: MODULE,
            suite: "UserFailures",
            name: "nonexistent_user",
            marks: &["get", "failure"],
            run: test_fn!(nonexistent_user),
        },
    ]
}

async fn get_response_code(ctx: &mut TestContext) -> TestResult {
    let response = ctx.get("users").await?;
    validate_api_response(
        &response,
        &ResponseExpectation::status(200).within(Duration::from_secs(2)),
    )?;
    Ok(())
}

async fn get_response_data(ctx: &mut TestContext) -> TestResult {
    let response = ctx.get("users").await?;
    let data = response.json()?;

    let users = data.as_array().ok_or_else(|| {
        AssertionFailure::new(
            AssertionTarget::Body,
            "array",
            json_kind(&data),
            "user list is not an array",
        )
    })?;
    ensure(!users.is_empty(), "user list is empty")?;

    let first_user = &users[0];
    for key in USER_KEYS {
        ensure(
            first_user.get(key).is_some(),
            format!("field {key} is not in {first_user}"),
        )?;
    }
    Ok(())
}

async fn post_response_code(ctx: &mut TestContext) -> TestResult {
    let new_user = fake::user();
    let response = ctx.post_form("users", &new_user.form()).await?;
    skip_if_read_only(&response)?;

    let data = validate_api_response(
        &response,
        &ResponseExpectation::status(201)
            .fields(["id"])
            .within(Duration::from_secs(2)),
    )?;
    debug!("created user: {data}");

    if let Some(created_at) = data.get("createdAt") {
        let year = Local::now().year().to_string();
        let stamp = created_at
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| created_at.to_string());
        ensure(
            stamp.contains(&year),
            format!("createdAt {stamp} is not in the current year {year}"),
        )?;
    }
    Ok(())
}

/// Create, read, update and delete one user through the chained id.
/// The public service does not persist writes, so reads after the create
/// accept 404.
async fn full_lifecycle(ctx: &mut TestContext) -> TestResult {
    info!("chained requests: GET, POST, GET, PATCH, DELETE, GET");

    let response = ctx.get("users").await?;
    let users = response.json()?;
    ctx.check.equal(response.status, 200, "listing users");
    ctx.check.is_true(
        users.as_array().is_some_and(|list| !list.is_empty()),
        "user list is not empty",
    );

    let new_user = fake::user();
    let response = ctx.post_form("users", &new_user.form()).await?;
    skip_if_read_only(&response)?;
    ensure_status_in(&response, &[201])?;
    let created = response.json()?;
    let user_id = created.get("id").and_then(id_segment).ok_or_else(|| {
        AssertionFailure::new(
            AssertionTarget::JsonField("id".to_string()),
            "non-null id",
            created.get("id").map_or_else(|| "missing".to_string(), Value::to_string),
            "created user has no id",
        )
    })?;
    let user_path = format!("users/{user_id}");

    let response = ctx.get(&user_path).await?;
    ctx.check.is_in(response.status, &[200, 404], "created user lookup");

    let phone = fake::phone_number();
    let response = ctx.patch_form(&user_path, &[("phone", phone.as_str())]).await?;
    ensure_status_in(&response, &[200, 204])?;
    if response.has_body() {
        let updated = response.json()?;
        let actual = updated.get("phone").and_then(Value::as_str);
        if actual != Some(phone.as_str()) {
            return Err(AssertionFailure::new(
                AssertionTarget::JsonField("phone".to_string()),
                phone.clone(),
                actual.unwrap_or("missing"),
                "patched phone was not returned",
            )
            .into());
        }
    }

    let response = ctx.delete(&user_path).await?;
    ensure_status_in(&response, &[200, 204, 404])?;

    let response = ctx.get(&user_path).await?;
    ensure_status_in(&response, &[404, 204])?;
    Ok(())
}

/// Fails on purpose against a real service: every check is soft so both
/// show up in the report. A failure screenshot comes from the capture hook.
async fn nonexistent_user(ctx: &mut TestContext) -> TestResult {
    let response = ctx.get(&format!("users/{MISSING_USER_ID}")).await?;

    ctx.check.status(
        response.status,
        200,
        format!("expected 200 but the API returned {}", response.status),
    );
    ctx.check.is_true(
        response.content_type().contains("json"),
        "the content type must be JSON",
    );
    Ok(())
}

/// A deployment that refuses writes cannot exercise the write tests.
fn skip_if_read_only(response: &HttpResponse) -> TestResult {
    if matches!(response.status, 405 | 501) {
        return Err(TestError::Skipped(format!(
            "service does not accept writes ({} {})",
            response.status, response.status_text
        )));
    }
    Ok(())
}

/// Path segment for an id the service returned; numbers and non-empty
/// strings are accepted as-is.
fn id_segment(id: &Value) -> Option<String> {
    match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
