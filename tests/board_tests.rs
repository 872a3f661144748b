use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use std::fs;
mod test_env;

fn setup_test_env(extra_config: &str) -> (TempDir, std::sync::MutexGuard<'static, ()>) {
    let guard = test_env::lock_test_env();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let config_dir = temp_dir.path().join(".casetrack");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("rc"),
        format!("data.location={}\n{}", db_path.display(), extra_config),
    ).unwrap();
    std::env::set_var("HOME", temp_dir.path().to_str().unwrap());
    (temp_dir, guard)
}

fn get_case_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("casetrack").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd
}

fn json_of(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success();
    serde_json::from_slice(&output.get_output().stdout).unwrap()
}

#[test]
fn test_board_groups_active_cases_by_stage() {
    let (temp_dir, _guard) = setup_test_env("");
    get_case_cmd(&temp_dir).args(["add", "Fresh claim", "--claim", "1000"]).assert().success();
    get_case_cmd(&temp_dir).args(["add", "Old claim", "--claim", "2500", "--since", "-45d"]).assert().success();
    get_case_cmd(&temp_dir).args(["add", "Hearing claim", "--stage", "hearing", "--priority", "high"]).assert().success();
    get_case_cmd(&temp_dir).args(["add", "Closed claim"]).assert().success();
    get_case_cmd(&temp_dir).args(["end", "4", "-o", "won", "-r", "judgment"]).assert().success();

    let board = json_of(get_case_cmd(&temp_dir).args(["board", "labor", "--json"]));
    assert_eq!(board["category"], "labor");
    let columns = board["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 7);
    assert_eq!(columns[0]["stage"]["id"], "filing");
    assert_eq!(columns[0]["count"], 2);
    assert_eq!(columns[0]["total_claim_value"], 3500.0);
    assert_eq!(columns[0]["overdue_count"], 1);
    assert_eq!(columns[3]["stage"]["id"], "hearing");
    assert_eq!(columns[3]["count"], 1);

    // Closed case left the board; totals only cover what is shown
    let total: u64 = columns.iter().map(|c| c["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 3);
    assert_eq!(board["totals"]["count"], 3);
    assert_eq!(board["totals"]["urgent_count"], 1);
    assert_eq!(board["totals"]["stale_count"], 1);

    let all = json_of(get_case_cmd(&temp_dir).args(["board", "labor", "--all", "--json"]));
    assert_eq!(all["totals"]["count"], 4);
    assert_eq!(all["totals"]["win_rate"], 100);

    drop(temp_dir);
}

#[test]
fn test_board_text_output() {
    let (temp_dir, _guard) = setup_test_env("");
    get_case_cmd(&temp_dir).args(["add", "Dormant file", "--since", "-40d"]).assert().success();

    get_case_cmd(&temp_dir).args(["board"]).assert().success()
        .stdout(predicate::str::contains("Board: labor"))
        .stdout(predicate::str::contains("=== Case Filing (1)"))
        .stdout(predicate::str::contains("1 overdue"))
        .stdout(predicate::str::contains("Dormant file"))
        .stdout(predicate::str::contains("(empty)"));

    drop(temp_dir);
}

#[test]
fn test_overdue_threshold_from_config() {
    let (temp_dir, _guard) = setup_test_env("board.overdue_days=60\npipeline.stale_days=50\n");
    get_case_cmd(&temp_dir).args(["add", "Dormant file", "--since", "-40d"]).assert().success();

    let board = json_of(get_case_cmd(&temp_dir).args(["board", "--json"]));
    assert_eq!(board["columns"][0]["overdue_count"], 0);
    assert_eq!(board["totals"]["stale_count"], 0);

    drop(temp_dir);
}

#[test]
fn test_board_unknown_category() {
    let (temp_dir, _guard) = setup_test_env("");

    get_case_cmd(&temp_dir).args(["board", "famly"]).assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Did you mean 'family'?"));

    drop(temp_dir);
}

#[test]
fn test_stats_outcomes_and_win_rate() {
    let (temp_dir, _guard) = setup_test_env("");
    for i in 1..=10 {
        get_case_cmd(&temp_dir).args(["add", &format!("Case {}", i)]).assert().success();
    }
    for (id, outcome) in [("1", "won"), ("2", "won"), ("3", "won"), ("4", "lost"), ("5", "settled")] {
        get_case_cmd(&temp_dir).args(["end", id, "-o", outcome, "-r", "done"]).assert().success();
    }

    let stats = json_of(get_case_cmd(&temp_dir).args(["stats", "--json"]));
    assert_eq!(stats["totals"]["count"], 10);
    assert_eq!(stats["totals"]["won"], 3);
    assert_eq!(stats["totals"]["lost"], 1);
    assert_eq!(stats["totals"]["settled"], 1);
    assert_eq!(stats["totals"]["active"], 5);
    assert_eq!(stats["totals"]["win_rate"], 80);
    assert!(stats.get("per_stage").is_none());

    get_case_cmd(&temp_dir).args(["stats"]).assert().success()
        .stdout(predicate::str::contains("Win rate:      80%"));

    let labor = json_of(get_case_cmd(&temp_dir).args(["stats", "labor", "--json"]));
    assert_eq!(labor["per_stage"][0]["stage_id"], "filing");
    assert_eq!(labor["per_stage"][0]["count"], 10);

    drop(temp_dir);
}

#[test]
fn test_stages_listing() {
    let (temp_dir, _guard) = setup_test_env("");

    get_case_cmd(&temp_dir).args(["stages"]).assert().success()
        .stdout(predicate::str::contains("labor"))
        .stdout(predicate::str::contains("(default)"))
        .stdout(predicate::str::contains("administrative"));

    let stages = json_of(get_case_cmd(&temp_dir).args(["stages", "civil", "--json"]));
    let ids: Vec<&str> = stages.as_array().unwrap().iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["filing", "notification", "hearing", "judgment", "appeal", "execution"]);

    get_case_cmd(&temp_dir).args(["--lang", "ar", "stages", "labor"]).assert().success()
        .stdout(predicate::str::contains("التسوية الودية"));

    drop(temp_dir);
}

#[test]
fn test_custom_catalog_file() {
    let catalog = r#"{
        "default": "arbitration",
        "catalogs": {
            "arbitration": [
                {"id": "request", "name": "Request", "name_ar": "الطلب", "order": 0},
                {"id": "tribunal", "name": "Tribunal", "name_ar": "الهيئة", "order": 1, "is_mandatory": true},
                {"id": "award", "name": "Award", "name_ar": "الحكم", "order": 2, "can_end": true}
            ]
        }
    }"#;
    let (temp_dir, _guard) = setup_test_env("catalog.location=catalogs.json\n");
    fs::write(temp_dir.path().join(".casetrack").join("catalogs.json"), catalog).unwrap();

    get_case_cmd(&temp_dir).args(["stages"]).assert().success()
        .stdout(predicate::str::contains("arbitration"))
        .stdout(predicate::str::contains("labor").not());

    get_case_cmd(&temp_dir).args(["add", "Shipping arbitration"]).assert().success()
        .stdout(predicate::str::contains("(arbitration, Request)"));
    get_case_cmd(&temp_dir).args(["next", "1"]).assert().success()
        .stdout(predicate::str::contains("Tribunal (2/3)"));

    drop(temp_dir);
}

#[test]
fn test_invalid_catalog_file_is_reported() {
    let catalog = r#"{"default": "x", "catalogs": {"x": [{"id": "a", "name": "A", "name_ar": "A", "order": 1}]}}"#;
    let (temp_dir, _guard) = setup_test_env("catalog.location=catalogs.json\n");
    fs::write(temp_dir.path().join(".casetrack").join("catalogs.json"), catalog).unwrap();

    get_case_cmd(&temp_dir).args(["stages"]).assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid catalog file"));

    drop(temp_dir);
}
