use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_becadosd");
    let mut child = Command::new(exe)
        .env_remove("BECADOS_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn becadosd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    assert_eq!(value["ok"], false, "expected failure, got {}", value);
    value["error"]["code"].as_str().expect("error code")
}

fn create_user(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    params: serde_json::Value,
) -> String {
    let res = request_ok(stdin, reader, id, "users.create", params);
    res["userId"].as_str().expect("userId").to_string()
}

fn submit(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    student_id: &str,
    hours: f64,
) -> String {
    let res = request_ok(
        stdin,
        reader,
        id,
        "evidence.submit",
        json!({ "studentId": student_id, "description": "Soporte en laboratorio", "hours": hours }),
    );
    assert_eq!(res["status"], "pendiente");
    res["evidenceId"].as_str().expect("evidenceId").to_string()
}

fn open_workspace(prefix: &str) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let workspace = temp_dir(prefix);
    let (child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    (child, stdin, reader)
}

#[test]
fn review_is_restricted_to_reviewers_of_the_right_area() {
    let (_child, mut stdin, mut reader) = open_workspace("becados-evidence-review");
    let student = create_user(
        &mut stdin,
        &mut reader,
        "1",
        json!({ "fullName": "Ana", "role": "becado", "internshipArea": "Sistemas", "hoursRequired": 120 }),
    );
    let peer = create_user(
        &mut stdin,
        &mut reader,
        "2",
        json!({ "fullName": "Beto", "role": "becado", "internshipArea": "Sistemas", "hoursRequired": 120 }),
    );
    let other_admin = create_user(
        &mut stdin,
        &mut reader,
        "3",
        json!({ "fullName": "Marta", "role": "admin", "internshipArea": "Biblioteca" }),
    );
    let area_admin = create_user(
        &mut stdin,
        &mut reader,
        "4",
        json!({ "fullName": "Luis", "role": "admin", "internshipArea": "Sistemas" }),
    );
    let boss = create_user(
        &mut stdin,
        &mut reader,
        "5",
        json!({ "fullName": "Rosa", "role": "jefe_area" }),
    );

    let first = submit(&mut stdin, &mut reader, "6", &student, 4.0);
    let second = submit(&mut stdin, &mut reader, "7", &student, 2.5);

    let by_peer = request(
        &mut stdin,
        &mut reader,
        "8",
        "evidence.review",
        json!({ "evidenceId": first, "actorId": peer, "decision": "approve" }),
    );
    assert_eq!(error_code(&by_peer), "forbidden");

    let by_other_area = request(
        &mut stdin,
        &mut reader,
        "9",
        "evidence.review",
        json!({ "evidenceId": first, "actorId": other_admin, "decision": "approve" }),
    );
    assert_eq!(error_code(&by_other_area), "forbidden");

    let approved = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "evidence.review",
        json!({ "evidenceId": first, "actorId": area_admin, "decision": "approve" }),
    );
    assert_eq!(approved["status"], "aprobada");

    let twice = request(
        &mut stdin,
        &mut reader,
        "11",
        "evidence.review",
        json!({ "evidenceId": first, "actorId": boss, "decision": "reject" }),
    );
    assert_eq!(error_code(&twice), "invalid_state");

    let rejected = request_ok(
        &mut stdin,
        &mut reader,
        "12",
        "evidence.review",
        json!({ "evidenceId": second, "actorId": boss, "decision": "reject" }),
    );
    assert_eq!(rejected["status"], "rechazada");

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "13",
        "evidence.list",
        json!({ "studentId": student }),
    );
    let evidences = listed["evidences"].as_array().expect("evidences");
    assert_eq!(evidences.len(), 2);
    assert_eq!(evidences[0]["id"], second.as_str());
    assert_eq!(evidences[1]["reviewedBy"], area_admin.as_str());

    let progress = request_ok(
        &mut stdin,
        &mut reader,
        "14",
        "progress.get",
        json!({ "studentId": student }),
    );
    assert_eq!(progress["progress"]["currentHours"], 4.0);
    assert_eq!(progress["progress"]["completed"], false);
}

#[test]
fn submit_rejects_non_positive_hours() {
    let (_child, mut stdin, mut reader) = open_workspace("becados-evidence-hours");
    let student = create_user(
        &mut stdin,
        &mut reader,
        "1",
        json!({ "fullName": "Ana", "role": "becado", "hoursRequired": 120 }),
    );
    for (i, hours) in [json!(0), json!(-3), json!("4")].into_iter().enumerate() {
        let res = request(
            &mut stdin,
            &mut reader,
            &format!("bad-{}", i),
            "evidence.submit",
            json!({ "studentId": student, "description": "x", "hours": hours }),
        );
        assert_eq!(error_code(&res), "bad_params");
    }
}

#[test]
fn progress_caps_at_one_hundred_percent() {
    let (_child, mut stdin, mut reader) = open_workspace("becados-progress-cap");
    let student = create_user(
        &mut stdin,
        &mut reader,
        "1",
        json!({ "fullName": "Ana", "role": "becado", "hoursRequired": 120 }),
    );
    let boss = create_user(
        &mut stdin,
        &mut reader,
        "2",
        json!({ "fullName": "Rosa", "role": "jefe_area" }),
    );
    for (i, hours) in [100.0, 50.0].iter().enumerate() {
        let evidence = submit(&mut stdin, &mut reader, &format!("s{}", i), &student, *hours);
        request_ok(
            &mut stdin,
            &mut reader,
            &format!("r{}", i),
            "evidence.review",
            json!({ "evidenceId": evidence, "actorId": boss, "decision": "approve" }),
        );
    }

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "progress.get",
        json!({ "studentId": student }),
    );
    let progress = &res["progress"];
    assert_eq!(progress["currentHours"], 150.0);
    assert_eq!(progress["hoursRequired"], 120.0);
    assert_eq!(progress["percent"], 100.0);
    assert_eq!(progress["completed"], true);
}

#[test]
fn zero_requirement_is_a_configuration_error() {
    let (_child, mut stdin, mut reader) = open_workspace("becados-progress-config");
    let configured = create_user(
        &mut stdin,
        &mut reader,
        "1",
        json!({ "fullName": "Ana", "role": "becado", "internshipArea": "Sistemas", "hoursRequired": 80 }),
    );
    let unconfigured = create_user(
        &mut stdin,
        &mut reader,
        "2",
        json!({ "fullName": "Beto", "role": "becado", "internshipArea": "Sistemas", "hoursRequired": 0 }),
    );

    let res = request(
        &mut stdin,
        &mut reader,
        "3",
        "progress.get",
        json!({ "studentId": unconfigured }),
    );
    assert_eq!(error_code(&res), "configuration_error");
    assert_eq!(res["error"]["details"]["studentId"], unconfigured.as_str());

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "progress.list",
        json!({ "internshipArea": "Sistemas" }),
    );
    let students = listed["students"].as_array().expect("students");
    assert_eq!(students.len(), 2);
    assert_eq!(students[0]["studentId"], configured.as_str());
    assert_eq!(students[0]["percent"], 0.0);
    assert_eq!(students[1]["studentId"], unconfigured.as_str());
    assert!(students[1]["percent"].is_null());
    assert!(students[1]["configurationError"].is_string());

    let elsewhere = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "progress.list",
        json!({ "internshipArea": "Biblioteca" }),
    );
    assert!(elsewhere["students"].as_array().expect("students").is_empty());
}
