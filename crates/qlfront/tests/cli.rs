use qlfront::args::{ParseArgs, QueryArgs, parse_scalar};
use qlfront::commands::Commands;
use qlfront_exec::errors::ExecError;
use qlfront_parser::context::DEFAULT_READ_SIZE;
use qlfront_repr::scalar::ScalarValue;

fn run(command: Commands) -> (anyhow::Result<()>, String) {
    logutil::init_test();
    let mut out = Vec::new();
    let result = command.run(&mut out);
    (result, String::from_utf8(out).unwrap())
}

fn parse_args(sql: &str) -> ParseArgs {
    ParseArgs {
        sql: sql.to_string(),
        read_size: DEFAULT_READ_SIZE,
        tokens: false,
        trace_scanning: false,
        trace_parsing: false,
    }
}

fn query_args(sql: &str) -> QueryArgs {
    QueryArgs {
        sql: sql.to_string(),
        binds: Vec::new(),
        settings: Vec::new(),
        resume_at: None,
        all_pages: false,
    }
}

fn page_size(n: i64) -> Vec<(String, ScalarValue)> {
    vec![("default_page_size".to_string(), ScalarValue::Int64(n))]
}

const ROLES: &str = "select role, can_login, is_superuser from system_auth.roles";

#[test]
fn query_roles() {
    let (result, out) = run(Commands::Query(query_args(ROLES)));
    result.unwrap();
    insta::assert_snapshot!(out.trim_end(), @r"
    role      | can_login | is_superuser
    ----------+-----------+-------------
    app       | true      | false
    cassandra | true      | true
    reader    | false     | false
    (3 rows)
    ");
}

#[test]
fn query_first_page() {
    let mut args = query_args(ROLES);
    args.settings = page_size(2);
    let (result, out) = run(Commands::Query(args));
    result.unwrap();
    insta::assert_snapshot!(out.trim_end(), @r"
    role      | can_login | is_superuser
    ----------+-----------+-------------
    app       | true      | false
    cassandra | true      | true
    (2 rows)
    more rows available, resume with --resume-at 2
    ");
}

#[test]
fn query_resume_at() {
    let mut args = query_args(ROLES);
    args.settings = page_size(2);
    args.resume_at = Some(2);
    let (result, out) = run(Commands::Query(args));
    result.unwrap();
    insta::assert_snapshot!(out.trim_end(), @r"
    role   | can_login | is_superuser
    -------+-----------+-------------
    reader | false     | false
    (1 row)
    ");
}

#[test]
fn query_all_pages_matches_unpaged() {
    let (_, unpaged) = run(Commands::Query(query_args(ROLES)));

    let mut args = query_args(ROLES);
    args.settings = page_size(1);
    args.all_pages = true;
    let (result, paged) = run(Commands::Query(args));
    result.unwrap();
    assert_eq!(unpaged, paged);
}

#[test]
fn query_zero_limit_all_pages() {
    let mut args = query_args("select * from system_auth.roles limit 0");
    args.all_pages = true;
    let (result, out) = run(Commands::Query(args));
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExecError>(),
        Some(ExecError::InvalidArgument(_))
    ));
    assert!(out.is_empty());
}

#[test]
fn query_with_bind() {
    let mut args = query_args(
        "select resource, permissions from system_auth.role_permissions where role = ?",
    );
    args.binds = vec![parse_scalar("reader").unwrap()];
    let (result, out) = run(Commands::Query(args));
    result.unwrap();
    insta::assert_snapshot!(out.trim_end(), @r"
    resource | permissions
    ---------+------------
    data/app | [SELECT]
    (1 row)
    ");
}

#[test]
fn query_reports_warnings() {
    let (result, out) =
        run(Commands::Query(query_args("select role from system_auth.roles allow filtering")));
    result.unwrap();
    assert!(out.starts_with("warning: "));
    assert!(out.contains("ALLOW FILTERING has no effect on system tables"));
    assert!(out.contains("(3 rows)"));
}

#[test]
fn query_write_rejected() {
    let (result, _) = run(Commands::Query(query_args(
        "insert into system_auth.roles (role) values ('x')",
    )));
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExecError>(),
        Some(ExecError::ReadOnlyTable(_))
    ));
}

#[test]
fn query_unknown_setting() {
    let mut args = query_args(ROLES);
    args.settings = vec![("no_such_setting".to_string(), ScalarValue::Int64(1))];
    let (result, out) = run(Commands::Query(args));
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ExecError>(),
        Some(ExecError::UnknownSetting(_))
    ));
    assert!(out.is_empty());
}

#[test]
fn query_parse_error_rendered() {
    let sql = "select * form system_auth.roles";
    let (result, out) = run(Commands::Query(query_args(sql)));
    assert!(result.is_err());
    assert!(out.contains("select * form system_auth.roles\n         ^"));
}

#[test]
fn parse_bind_variables() {
    let (result, out) = run(Commands::Parse(parse_args(
        "select * from system_auth.roles where role = :r and can_login = ?",
    )));
    result.unwrap();
    insta::assert_snapshot!(out.trim_end(), @r"
    SELECT system_auth.roles
    bind variables:
      1:46 :r
      1:65 ?
    ");
}

#[test]
fn parse_tokens() {
    let mut args = parse_args("select *\nfrom ks.t");
    args.tokens = true;
    args.read_size = 3;
    let (result, out) = run(Commands::Parse(args));
    result.unwrap();
    insta::assert_snapshot!(out.trim_end(), @r"
    1:1    select
    1:8    *
    2:1    from
    2:6    ks
    2:8    .
    2:9    t
    SELECT ks.t
    ");
}

#[test]
fn parse_zero_read_size() {
    let mut args = parse_args("select * from ks.t");
    args.read_size = 0;
    let (result, out) = run(Commands::Parse(args));
    assert!(result.is_err());
    assert!(out.is_empty());
}

#[test]
fn settings_listed() {
    let (result, out) = run(Commands::Settings);
    result.unwrap();
    let page_size = out
        .lines()
        .find(|line| line.starts_with("default_page_size"))
        .unwrap();
    assert!(page_size.contains("| 5000 "));
    assert!(out.contains("scanner_read_size"));
    assert!(out.trim_end().ends_with("(5 rows)"));
}
