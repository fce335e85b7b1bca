//! End-to-end tests: the real `UreqTransport` against the mock server on an
//! ephemeral port. Every test starts its own server, so state never leaks
//! between tests.

use clap::Parser;
use cmk_cli::cli::Cli;
use cmk_cli::commands;
use cmk_core::{
    ActivateMode, ApiCall, ApiError, Attributes, DiscoverMode, Format, GroupKind, HostTagConfig,
    NewHost, Params, WebApi,
};
use serde_json::{json, Value};

fn start_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    listener.set_nonblocking(true).unwrap();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            mock_server::run(listener).await.unwrap();
        });
    });
    format!("http://{addr}/mysite")
}

fn client() -> WebApi {
    WebApi::new(
        &start_server(),
        mock_server::DEFAULT_USERNAME,
        mock_server::DEFAULT_SECRET,
    )
}

fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

fn run_cli(api: &WebApi, args: &[&str]) -> Result<Value, cmk_cli::CliError> {
    let cli = Cli::parse_from(std::iter::once("cmkclient").chain(args.iter().copied()));
    commands::execute(api, cli.command)
}

// --- connection ---

#[test]
fn every_url_shape_reaches_the_same_endpoint() {
    let site = start_server();
    for url in [
        site.clone(),
        format!("{site}/check_mk/"),
        format!("{site}/check_mk/webapi.py"),
    ] {
        let api = WebApi::new(&url, "automation", "secret");
        assert_eq!(api.endpoint(), format!("{site}/check_mk/webapi.py"));
        assert_eq!(api.get_all_folders().unwrap(), json!({"": {}}));
    }
}

#[test]
fn wrong_secret_is_an_authentication_error() {
    let api = WebApi::new(&start_server(), "automation", "wrong");
    let err = api.get_all_hosts(false).unwrap_err();
    assert!(matches!(err, ApiError::Authentication(ref msg) if msg.starts_with("Authentication error:")));
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let api = WebApi::new("http://127.0.0.1:1/mysite", "automation", "secret");
    assert!(matches!(api.get_all_hosts(false), Err(ApiError::Transport(_))));
}

// --- hosts and folders ---

#[test]
fn host_lifecycle() {
    let api = client();
    api.add_folder("lab", false, &attrs(json!({"site": "local"})))
        .unwrap();
    api.add_host(
        &NewHost::new("web01")
            .folder("/lab")
            .ipaddress("10.0.0.1")
            .tag("os", "linux"),
    )
    .unwrap();
    api.add_host(&NewHost::new("db01")).unwrap();

    let host = api.get_host("web01", true).unwrap();
    assert_eq!(host["attributes"]["tag_os"], "linux");
    assert_eq!(host["attributes"]["site"], "local");
    let plain = api.get_host("web01", false).unwrap();
    assert!(plain["attributes"].get("site").is_none());

    api.edit_host(
        "web01",
        &attrs(json!({"alias": "Web"})),
        Some(&["ipaddress".to_string()][..]),
    )
    .unwrap();
    let host = api.get_host("web01", false).unwrap();
    assert_eq!(host["attributes"], json!({"tag_os": "linux", "alias": "Web"}));

    let in_lab = api.get_hosts_by_folder("lab", false).unwrap();
    assert_eq!(in_lab.keys().collect::<Vec<_>>(), ["web01"]);

    let err = api.add_host(&NewHost::new("web01")).unwrap_err();
    assert!(matches!(err, ApiError::Result { code: 1, .. }));

    assert_eq!(api.delete_all_hosts().unwrap(), ["db01", "web01"]);
    assert_eq!(api.get_all_hosts(false).unwrap(), json!({}));
}

#[test]
fn batch_delete_removes_listed_hosts() {
    let api = client();
    for name in ["a", "b", "c"] {
        api.add_host(&NewHost::new(name)).unwrap();
    }
    api.delete_hosts(&["a".to_string(), "c".to_string()]).unwrap();
    api.delete_host("b").unwrap();
    assert_eq!(api.get_all_hosts(false).unwrap(), json!({}));
}

#[test]
fn folders_nest_and_delete_recursively() {
    let api = client();
    let err = api.add_folder("a/b", false, &Attributes::new()).unwrap_err();
    assert!(matches!(err, ApiError::Result { code: 1, .. }));

    api.add_folder("a/b", true, &Attributes::new()).unwrap();
    api.edit_folder("a", &attrs(json!({"alias": "A"}))).unwrap();
    let folder = api.get_folder("a/b", true).unwrap();
    assert_eq!(folder["attributes"]["alias"], "A");

    api.delete_folder("a").unwrap();
    assert_eq!(api.get_all_folders().unwrap(), json!({"": {}}));
}

#[test]
fn discovery_reports_counters_per_host() {
    let api = client();
    api.add_host(&NewHost::new("h1")).unwrap();
    api.add_host(&NewHost::new("h2")).unwrap();

    let first = api.discover_services("h1", DiscoverMode::New).unwrap();
    assert_eq!(first.added, Some(3));
    assert_eq!(first.new_count, Some(3));

    let all = api.discover_services_for_all_hosts(DiscoverMode::FixAll).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].hostname, "h1");
    assert_eq!(all[0].counters.kept, Some(3));
    assert_eq!(all[1].hostname, "h2");
    assert_eq!(all[1].counters.added, Some(3));
}

// --- groups ---

#[test]
fn group_families_are_independent() {
    let api = client();
    api.add_group(GroupKind::Host, "web", "Web servers").unwrap();
    api.add_group(GroupKind::Contact, "ops", "Operations").unwrap();
    api.edit_group(GroupKind::Host, "web", "Web tier").unwrap();

    assert_eq!(api.get_group(GroupKind::Host, "web").unwrap(), json!({"alias": "Web tier"}));
    let err = api.get_group(GroupKind::Service, "web").unwrap_err();
    assert!(matches!(err, ApiError::NotFound { kind: "service group", .. }));

    assert_eq!(api.delete_all_groups(GroupKind::Contact).unwrap(), ["ops"]);
    assert_eq!(api.get_all_groups(GroupKind::Contact).unwrap(), json!({}));
    api.delete_group(GroupKind::Host, "web").unwrap();
}

// --- users ---

#[test]
fn user_lifecycle() {
    let api = client();
    api.add_user("jdoe", "Jane Doe", "hunter2", &attrs(json!({"pager": "555"})))
        .unwrap();
    api.add_automation_user("bot", "Bot", "t0ken", &Attributes::new())
        .unwrap();

    let user = api.get_user("jdoe").unwrap();
    assert_eq!(user["alias"], "Jane Doe");
    assert!(user.get("password").is_none());

    api.edit_user("jdoe", &attrs(json!({"alias": "J. Doe"})), &["pager".to_string()])
        .unwrap();
    assert_eq!(api.get_user("jdoe").unwrap(), json!({"alias": "J. Doe"}));

    api.delete_user("jdoe").unwrap();
    assert!(matches!(api.get_user("jdoe"), Err(ApiError::NotFound { kind: "user", .. })));
    assert_eq!(api.get_user("bot").unwrap()["automation_secret"], "t0ken");
}

// --- rulesets, host tags, sites ---

#[test]
fn rulesets_travel_as_python_literals() {
    let api = client();
    let mut ruleset = Params::new();
    ruleset.insert("".into(), json!([{"value": ["Log .*"], "condition": {}}]));
    api.set_ruleset("ignored_services", &ruleset).unwrap();

    let fetched = api.get_ruleset("ignored_services").unwrap();
    assert_eq!(fetched["ruleset"][""][0]["value"][0], "Log .*");
    let info = api.get_rulesets_info().unwrap();
    assert_eq!(info["ignored_services"]["number_of_rules"], 1);

    let err = api.get_ruleset("no_such_ruleset").unwrap_err();
    assert!(matches!(err, ApiError::Result { code: 1, .. }));
}

#[test]
fn hosttags_read_modify_write() {
    let api = client();
    let mut config = HostTagConfig::from_value(api.get_hosttags().unwrap()).unwrap();
    assert!(config.configuration_hash.is_some());
    config
        .tag_groups
        .push(json!({"id": "criticality", "title": "Criticality", "tags": []}));
    api.set_hosttags(&config).unwrap();

    // The hash from the first read is stale now.
    let err = api.set_hosttags(&config).unwrap_err();
    assert!(matches!(err, ApiError::Result { code: 1, .. }));

    let reread = HostTagConfig::from_value(api.get_hosttags().unwrap()).unwrap();
    assert_eq!(reread.tag_groups.len(), 1);
}

#[test]
fn site_lifecycle() {
    let api = client();
    let config = attrs(json!({"alias": "R & D", "disabled": false, "timeout": 10}));
    api.set_site("remote", &config).unwrap();

    let site = api.get_site("remote").unwrap();
    assert_eq!(site["site_config"]["alias"], "R & D");
    assert_eq!(site["site_config"]["disabled"], "0");

    api.login_site("remote", "cmkadmin", "pw").unwrap();
    api.logout_site("remote").unwrap();
    api.delete_site("remote").unwrap();
    assert!(api.get_site("remote").is_err());
}

// --- activation and raw calls ---

#[test]
fn activation_needs_changes_first() {
    let api = client();
    let err = api.activate_changes(ActivateMode::Dirty, None, false).unwrap_err();
    assert!(matches!(err, ApiError::Result { code: 1, .. }));

    api.add_host(&NewHost::new("h1")).unwrap();
    let result = api.activate_changes(ActivateMode::Dirty, None, true).unwrap();
    assert_eq!(result["sites"]["local"]["_state"], "success");

    let sites = ["local".to_string()];
    api.activate_changes(ActivateMode::Specific, Some(&sites[..]), false)
        .unwrap();
    api.bake_agents().unwrap();
}

#[test]
fn raw_call_with_python_output() {
    let api = client();
    let value = api
        .call(ApiCall::new("get_all_folders").output_format_as(Format::Python))
        .unwrap();
    assert_eq!(value, json!({"": {}}));

    let mut query = Params::new();
    query.insert("output_format".into(), "python".into());
    let value = api.make_request("get_rulesets_info", Some(query), None).unwrap();
    assert_eq!(value["host_groups"]["help"], Value::Null);
}

// --- command dispatch ---

#[test]
fn commands_drive_the_api() {
    let api = client();
    run_cli(&api, &["add-folder", "lab"]).unwrap();
    run_cli(&api, &["add-host", "web01", "--folder", "lab", "--tag", "os=linux"]).unwrap();
    run_cli(&api, &["hostgroup", "add", "web", "Web servers"]).unwrap();

    let hosts = run_cli(&api, &["get-hosts-by-folder", "lab"]).unwrap();
    assert_eq!(hosts["web01"]["attributes"]["tag_os"], "linux");

    let counters = run_cli(&api, &["discover-services", "web01", "--mode", "refresh"]).unwrap();
    assert_eq!(counters, json!({"added": 3, "removed": 0, "kept": 0, "new_count": 3}));

    let deleted = run_cli(&api, &["hostgroup", "delete-all"]).unwrap();
    assert_eq!(deleted, json!(["web"]));

    let raw = run_cli(&api, &["call", "get_host", "--data", r#"{"hostname": "web01"}"#]).unwrap();
    assert_eq!(raw["path"], "lab");

    let err = run_cli(&api, &["add-folder", "x/y", "--create-parent-folders", "false"]).unwrap_err();
    assert!(matches!(err, cmk_cli::CliError::Api(ApiError::Result { code: 1, .. })));
    run_cli(&api, &["add-folder", "a/b"]).unwrap();
    let folders = run_cli(&api, &["get-all-folders"]).unwrap();
    assert!(folders.get("a").is_some() && folders.get("a/b").is_some());

    let err = run_cli(&api, &["get-user", "nobody"]).unwrap_err();
    assert_eq!(err.to_string(), "user not found: nobody");
}
