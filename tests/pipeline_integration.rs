use keiba::config::{AptitudeMode, ScoringConfig};
use keiba::data::{load_entries, load_results, CourseWeights};
use keiba::evaluation::{evaluate_race, summarize, DEFAULT_GAP_THRESHOLD};
use keiba::models::Surface;
use keiba::pipeline::score_race;
use keiba::report::{report_file_name, scored_file_name, write_report, write_scored_csv};
use keiba::ScoringError;

const WEIGHTS: &str = r#"{
    "東京": {
        "芝1600": { "speed": 1.2, "lead": 0.7, "closing": 1.4 },
        "ダ1600": { "speed": 1.1, "lead": 1.0, "closing": 1.1 }
    },
    "中山": {
        "芝2000": { "speed": 1.0, "lead": 1.2, "closing": 0.9 }
    }
}"#;

fn race_card() -> String {
    let mut lines = vec![
        "枠番,馬番,馬名,オッズ,1走前_開催,1走前_距離,1走前_馬場,1走前_通過,1走前_タイム,1走前_上り,1走前_ペース,2走前_距離,2走前_通過,2走前_タイム,2走前_上り,2走前_ペース".to_string(),
    ];
    lines.push("1,1,アルファ,2.1,東京,芝1600,良,1-1,1:33.0,33.5,ミドル,芝1600,2-2,1:33.4,34.0,ミドル".to_string());
    lines.push("2,2,ベータ,5.4,中山,芝1600,良,8-8,1:34.0,34.5,ミドル,,,,,".to_string());
    lines.push("3,3,ガンマ,12.0,東京,芝1600,稍,14-14,1:35.0,35.5,ミドル,,,,,".to_string());
    lines.push("4,4,デルタ,30.5,,,,,,,,,,,,".to_string());
    lines.join("\n") + "\n"
}

fn results_table() -> &'static str {
    "着順,馬名,人気,オッズ\n\
     1,アルファ,1,2.1\n\
     2,ガンマ,4,12.0\n\
     3,ベータ,2,5.4\n\
     4,デルタ,3,30.5\n"
}

#[test]
fn test_score_race_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("race_2025TEST_raw.csv");
    std::fs::write(&input, race_card()).unwrap();

    let horses = load_entries(&input).unwrap();
    assert_eq!(horses.len(), 4);

    let weights = CourseWeights::from_json_str(WEIGHTS).unwrap();
    let config = ScoringConfig::new(1600, Surface::Turf).with_field_size(16);
    let race = score_race("2025TEST", "東京", &horses, &weights, &config).unwrap();

    assert_eq!(race.ranking.len(), 4);
    assert!(race.unscored.is_empty());

    let order: Vec<&str> = race.ranked_horses().map(|(_, h)| h.name.as_str()).collect();
    assert_eq!(order.first(), Some(&"アルファ"));
    assert_eq!(order.last(), Some(&"ガンマ"));

    // No usable history: neutral on every axis but still ranked
    let delta = &race.horses[3];
    assert!(delta.rank.is_some());
    assert_eq!(delta.raw.speed, None);
    assert!((delta.deviation.speed - 50.0).abs() < 1e-9);
    assert!((delta.deviation.closing - 50.0).abs() < 1e-9);
    assert!((delta.deviation.lead - 50.0).abs() < 1e-9);

    // Alpha has two usable turf races
    assert_eq!(race.horses[0].samples.speed, 2);
    assert_eq!(race.horses[0].samples.lead, 2);
}

#[test]
fn test_direct_mode_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("race_raw.csv");
    std::fs::write(&input, race_card()).unwrap();

    let horses = load_entries(&input).unwrap();
    let weights = CourseWeights::from_json_str(WEIGHTS).unwrap();
    let config = ScoringConfig::new(1600, Surface::Turf).with_mode(AptitudeMode::Direct);
    let race = score_race("2025TEST", "東京", &horses, &weights, &config).unwrap();

    let top = race.ranked_horses().next().unwrap();
    assert_eq!(top.1.name, "アルファ");
    assert_eq!(top.1.aptitude, top.1.raw_course_score);
}

#[test]
fn test_shift_jis_race_card() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("race_sjis_raw.csv");
    let card = race_card();
    let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(&card);
    assert!(!had_errors);
    std::fs::write(&input, bytes.as_ref()).unwrap();

    let horses = load_entries(&input).unwrap();
    assert_eq!(horses.len(), 4);
    assert_eq!(horses[0].name, "アルファ");
    assert_eq!(horses[0].past_races()[0].distance.as_deref(), Some("芝1600"));
}

#[test]
fn test_missing_weight_entry() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("race_raw.csv");
    std::fs::write(&input, race_card()).unwrap();

    let horses = load_entries(&input).unwrap();
    let weights = CourseWeights::from_json_str(WEIGHTS).unwrap();

    let config = ScoringConfig::new(2400, Surface::Turf);
    let err = score_race("r", "東京", &horses, &weights, &config).unwrap_err();
    assert!(matches!(err, ScoringError::MissingCourseWeight { .. }));
    assert!(err.is_config_error());

    let config = ScoringConfig::new(1600, Surface::Turf);
    let err = score_race("r", "小倉", &horses, &weights, &config).unwrap_err();
    assert!(matches!(err, ScoringError::UnknownCourse(_)));
}

#[test]
fn test_outputs_and_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("race_2025TEST_raw.csv");
    std::fs::write(&input, race_card()).unwrap();
    let results_path = dir.path().join("race_2025TEST_result.csv");
    std::fs::write(&results_path, results_table()).unwrap();

    let horses = load_entries(&input).unwrap();
    let weights = CourseWeights::from_json_str(WEIGHTS).unwrap();
    let config = ScoringConfig::new(1600, Surface::Turf);
    let race = score_race("2025TEST", "東京", &horses, &weights, &config).unwrap();

    let csv_path = dir.path().join("assets").join(scored_file_name(&race));
    write_scored_csv(&race, &csv_path).unwrap();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 5);
    assert!(csv.contains("アルファ"));

    let report_path = dir.path().join("reports").join(report_file_name(&race));
    write_report(&race, &report_path).unwrap();
    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("1位 | アルファ"));
    assert!(report.contains("デルタ"));

    let rows = load_results(&results_path).unwrap();
    let evaluation = evaluate_race(&race, &rows, DEFAULT_GAP_THRESHOLD);
    assert!(evaluation.top_pick_won());
    assert!(evaluation.unmatched.is_empty());

    let summary = summarize(&[evaluation]);
    assert_eq!(summary.races, 1);
    assert_eq!(summary.top_pick_wins, 1);
    assert!((summary.top_pick_win_rate - 1.0).abs() < 1e-9);
}
