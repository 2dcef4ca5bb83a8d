extern crate pagerank;
extern crate serde_json;
extern crate tempfile;

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use pagerank::rank_state::quiet_logger;
use pagerank::report::Manifest;
use pagerank::{Error, JobSettings, RankConfig, Retention};

const EDGES: &str = "\
# a small web
home about
home blog
home shop
about home
blog home
blog post1
blog post2
post1 blog
post2 blog
post2 home
shop home
shop cart
cart
";

fn job(dir: &Path, edges: &str) -> JobSettings {
    fs::create_dir_all(dir).unwrap();
    let input = dir.join("edges.txt");
    fs::write(&input, edges).unwrap();
    let mut s = JobSettings::new(input, dir.join("out"));
    s.threads = 3;
    s.top_k = 3;
    s
}

fn score_lines(path: &Path) -> Vec<(String, f64)> {
    fs::read_to_string(path).unwrap()
        .lines()
        .map(|l| {
            let mut parts = l.split('\t');
            let id = parts.next().unwrap().to_string();
            let rank = parts.next().unwrap();
            assert_eq!(rank.split('.').nth(1).unwrap().len(), 12, "precision of `{}`", l);
            assert!(parts.next().is_none());
            (id, rank.parse().unwrap())
        })
        .collect()
}

#[test]
fn full_run_on_disk() {
    let tmp = tempdir().unwrap();
    let s = job(tmp.path(), EDGES);
    let config = RankConfig { max_iterations: 100, ..RankConfig::default() };
    let summary = pagerank::run(&s, &config, &quiet_logger()).unwrap();

    assert_eq!(summary.nodes, 7);
    assert!(summary.converged);
    // `cart` alone on a line
    assert_eq!(summary.quality.malformed_edges, 1);

    let scores = score_lines(&s.output.join("final_scores.txt"));
    assert_eq!(scores.len(), 7);
    let ids: Vec<&str> = scores.iter().map(|(id, _)| id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    let total: f64 = scores.iter().map(|&(_, r)| r).sum();
    assert!((total - 1.0).abs() < 1e-6, "sum {}", total);

    let top = score_lines(&s.output.join("top_3.txt"));
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].0, "home");
    assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    assert_eq!(summary.top[0].id, "home");

    let manifest = Manifest::read(&s.output.join("manifest.json")).unwrap();
    assert_eq!(manifest.nodes, 7);
    assert_eq!(manifest.rounds, summary.rounds);
    assert!(manifest.outputs.contains(&"final_scores.txt".to_string()));
    assert!(manifest.outputs.contains(&format!("iteration_{}", summary.rounds)));

    let timings = fs::read_to_string(s.output.join("timings.csv")).unwrap();
    assert!(timings.starts_with("phase,duration_ms\n"));
    assert!(timings.contains("Preprocess,"));
    assert!(fs::read_to_string(s.output.join("performance_report.txt")).unwrap()
            .contains("Iteration_1_Map Phase"));

    // only the final round survives
    let rounds: Vec<String> = fs::read_dir(&s.output).unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("iteration_"))
        .collect();
    assert_eq!(rounds, vec![format!("iteration_{}", summary.rounds)]);
}

#[test]
fn disk_and_memory_agree() {
    let tmp = tempdir().unwrap();
    let config = RankConfig { threshold: 0.0, max_iterations: 6, ..RankConfig::default() };

    let on_disk = job(&tmp.path().join("disk"), EDGES);
    let mut in_memory = job(&tmp.path().join("mem"), EDGES);
    in_memory.in_memory = true;
    let a = pagerank::run(&on_disk, &config, &quiet_logger());
    let b = pagerank::run(&in_memory, &config, &quiet_logger());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.rounds, b.rounds);
    for (x, y) in a.top.iter().zip(b.top.iter()) {
        assert_eq!(x.id, y.id);
        assert!((x.rank - y.rank).abs() < 1e-9);
    }
}

#[test]
fn keeps_every_round_when_asked() {
    let tmp = tempdir().unwrap();
    let mut s = job(tmp.path(), EDGES);
    s.retention = Retention::All;
    let config = RankConfig { threshold: 0.0, max_iterations: 4, ..RankConfig::default() };
    pagerank::run(&s, &config, &quiet_logger()).unwrap();
    for i in 0..5 {
        assert!(s.output.join(format!("iteration_{}", i)).is_file(), "round {}", i);
    }
    let line = fs::read_to_string(s.output.join("iteration_0")).unwrap()
        .lines()
        .find(|l| l.starts_with("home\t"))
        .map(String::from)
        .unwrap();
    assert_eq!(line, "home\t0.142857142857|about,blog,shop");
}

#[test]
fn ids_with_commas_never_reach_round_files() {
    let tmp = tempdir().unwrap();
    let s = job(tmp.path(), "x a,b\na,b x\nx y\ny x\n");
    let config = RankConfig { threshold: 0.0, max_iterations: 4, ..RankConfig::default() };
    let summary = pagerank::run(&s, &config, &quiet_logger()).unwrap();

    assert_eq!(summary.nodes, 2);
    assert_eq!(summary.quality.malformed_edges, 2);
    let scores = score_lines(&s.output.join("final_scores.txt"));
    let ids: Vec<&str> = scores.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["x", "y"]);
    let total: f64 = scores.iter().map(|&(_, r)| r).sum();
    assert!((total - 1.0).abs() < 1e-9, "sum {}", total);
}

#[test]
fn failures_map_to_exit_codes() {
    let tmp = tempdir().unwrap();

    let missing = JobSettings::new(tmp.path().join("nope.txt"), tmp.path().join("out"));
    let e = pagerank::run(&missing, &RankConfig::default(), &quiet_logger()).unwrap_err();
    match e {
        Error::MissingInput(_) => assert_eq!(e.exit_code(), 1),
        other => panic!("unexpected {}", other),
    }

    let empty = job(&tmp.path().join("empty"), "# nothing here\n\n");
    let e = pagerank::run(&empty, &RankConfig::default(), &quiet_logger()).unwrap_err();
    match e {
        Error::NoNodes => assert_eq!(e.exit_code(), 3),
        other => panic!("unexpected {}", other),
    }
}
