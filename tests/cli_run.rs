// tests/cli_run.rs
//
// The `run` entry point driven from a Resflow.toml on disk.

use resflow::cli::CliArgs;
use resflow::run;
use resflow_test_utils::init_tracing;
use resflow_test_utils::tree::TempTree;

fn args(tree: &TempTree) -> CliArgs {
    CliArgs {
        config: tree.path("Resflow.toml").to_string_lossy().to_string(),
        units: Vec::new(),
        log_level: None,
        dry_run: false,
        watch: false,
    }
}

fn widget_project() -> TempTree {
    let tree = TempTree::new();
    tree.write(
        "Resflow.toml",
        r#"
[unit.M]
output = "out/M"
properties = { name = "Widget" }

[[unit.M.resources]]
directory = "src/main/resources"
filtering = true
includes = ["**/*.properties"]

[[unit.M.resources]]
directory = "src/main/resources"
excludes = ["**/*.properties"]
"#,
    );
    tree.write("src/main/resources/a.properties", "app.name=${name}\n");
    tree.write("src/main/resources/b.txt", "plain ${name}\n");
    tree
}

#[tokio::test]
async fn run_processes_project_and_persists_cache() {
    init_tracing();
    let tree = widget_project();

    assert!(run(args(&tree)).await.unwrap());
    assert_eq!(tree.read("out/M/a.properties"), "app.name=Widget\n");
    assert_eq!(tree.read("out/M/b.txt"), "plain ${name}\n");
    assert!(tree.exists(".resflow"));

    tree.remove("src/main/resources/b.txt");
    assert!(run(args(&tree)).await.unwrap());
    assert!(!tree.exists("out/M/b.txt"));
    assert!(tree.exists("out/M/a.properties"));
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    init_tracing();
    let tree = widget_project();

    let mut a = args(&tree);
    a.dry_run = true;
    assert!(run(a).await.unwrap());
    assert!(!tree.exists("out"));
    assert!(!tree.exists(".resflow"));
}

#[tokio::test]
async fn unit_errors_make_run_report_failure() {
    init_tracing();
    let tree = TempTree::new();
    tree.write(
        "Resflow.toml",
        r#"
[unit.broken]

[[unit.broken.resources]]
directory = "res"
"#,
    );
    tree.write("res/a.txt", "a");

    assert!(!run(args(&tree)).await.unwrap());
    assert!(!tree.exists("out"));
}

#[tokio::test]
async fn invalid_config_is_an_error() {
    init_tracing();
    let tree = TempTree::new();
    tree.write("Resflow.toml", "[project]\n");

    assert!(run(args(&tree)).await.is_err());
}
