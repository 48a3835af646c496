mod common;

use gocov_cobertura::config::{Config, Grouping};
use gocov_cobertura::convert::convert_at;
use gocov_cobertura::error::Error;
use gocov_cobertura::ignore::Ignore;
use gocov_cobertura::model::{Class, Line, Method};
use gocov_cobertura::modules::{GoModResolver, ModuleResolver, ResolvedPackage};
use gocov_cobertura::report::{DOCTYPE, XML_HEADER};

const PROFILE: &[u8] = include_bytes!("fixtures/testdata_set.txt");

fn lines(expected: &[(u32, u64)]) -> Vec<Line> {
    expected
        .iter()
        .map(|&(number, hits)| Line { number, hits })
        .collect()
}

/// (class name, filename, method names) for every class of a package.
fn class_layout(classes: &[Class]) -> Vec<(&str, &str, Vec<&str>)> {
    classes
        .iter()
        .map(|c| {
            let methods = c.methods.iter().map(|m| m.name.as_str()).collect();
            (c.name.as_str(), c.filename.as_str(), methods)
        })
        .collect()
}

fn method<'a>(class: &'a Class, name: &str) -> &'a Method {
    class
        .methods
        .iter()
        .find(|m| m.name == name)
        .unwrap_or_else(|| panic!("no method {name}"))
}

fn filtered_config() -> Config {
    Config {
        ignore: Ignore::new(None, Some(r"[\\/]func[45]\.go$"), true).unwrap(),
        ..Default::default()
    }
}

#[test]
fn converts_fixture_module() {
    let (coverage, _) = common::run(PROFILE, &filtered_config());

    assert_eq!(coverage.sources, vec![common::module_dir().to_string_lossy().to_string()]);
    assert_eq!(coverage.packages.len(), 1);

    let pkg = &coverage.packages[0];
    assert_eq!(pkg.name, common::PACKAGE);
    let names: Vec<&str> = pkg.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["-", "Type1"]);

    let free = &pkg.classes[0];
    assert_eq!(free.filename, "testdata/func1.go");
    assert_eq!(free.methods.len(), 1);
    let func1 = method(free, "Func1");
    assert_eq!(func1.lines, lines(&[(5, 1), (6, 0), (7, 0), (8, 0)]));
    assert_eq!(free.lines, func1.lines);
    assert_eq!(func1.line_rate, 0.25);

    let type1 = &pkg.classes[1];
    assert_eq!(type1.filename, "testdata/func2.go");
    let methods: Vec<&str> = type1.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(methods, vec!["Func2a", "Func2b", "Func2c"]);
    assert_eq!(method(type1, "Func2a").lines, lines(&[(8, 1), (9, 1), (10, 0), (11, 0)]));
    assert_eq!(method(type1, "Func2b").lines, lines(&[(14, 1), (15, 1)]));
    assert_eq!(method(type1, "Func2c").lines, lines(&[(17, 0), (18, 0)]));
    assert_eq!(type1.lines.len(), 8);
    assert_eq!(type1.line_rate, 0.5);

    assert_eq!(coverage.lines_valid, 12);
    assert_eq!(coverage.lines_covered, 5);
    assert_eq!(coverage.timestamp, common::TIMESTAMP);
}

#[test]
fn report_matches_model() {
    let (_, xml) = common::run(PROFILE, &filtered_config());

    let mut head = xml.lines();
    assert_eq!(head.next(), Some(XML_HEADER));
    assert_eq!(head.next(), Some(DOCTYPE));
    assert!(xml.ends_with("</coverage>\n"));

    assert!(xml.contains(r#"lines-covered="5" lines-valid="12""#));
    assert!(xml.contains(r#"timestamp="1700000000000""#));
    assert!(xml.contains(&format!(r#"<package name="{}" line-rate=""#, common::PACKAGE)));
    assert!(xml.contains(
        r#"<class name="Type1" filename="testdata/func2.go" line-rate="0.5" branch-rate="0" complexity="0">"#
    ));
    assert!(xml.contains(
        r#"<method name="Func2c" signature="" line-rate="0" branch-rate="0" complexity="0">"#
    ));
    assert!(!xml.contains("Func3"));
    assert!(!xml.contains("Func4"));
}

#[test]
fn default_config_keeps_every_file() {
    let (coverage, _) = common::run(PROFILE, &Config::default());

    let pkg = &coverage.packages[0];
    assert_eq!(
        class_layout(&pkg.classes),
        vec![
            ("-", "testdata/func1.go", vec!["Func1"]),
            ("Type1", "testdata/func2.go", vec!["Func2a", "Func2b", "Func2c"]),
            ("-", "testdata/func3.go", vec!["Func3"]),
            ("-", "testdata/func4.go", vec!["Func4"]),
        ]
    );
    assert_eq!(method(&pkg.classes[2], "Func3").lines, lines(&[(5, 1), (6, 1), (7, 1)]));
    assert_eq!(pkg.classes[2].lines, lines(&[(5, 1), (6, 1), (7, 1)]));
    assert_eq!(method(&pkg.classes[3], "Func4").lines, lines(&[(3, 1)]));

    assert_eq!(coverage.lines_valid, 16);
    assert_eq!(coverage.lines_covered, 9);
}

#[test]
fn generated_file_contributes_nothing() {
    let config = Config {
        ignore: Ignore::new(None, None, true).unwrap(),
        ..Default::default()
    };
    let (coverage, _) = common::run(PROFILE, &config);

    let files: Vec<&str> = coverage.packages[0]
        .classes
        .iter()
        .map(|c| c.filename.as_str())
        .collect();
    assert_eq!(files, vec!["testdata/func1.go", "testdata/func2.go", "testdata/func4.go"]);
}

#[test]
fn free_functions_of_each_file_stay_with_their_file() {
    let profile = format!(
        "mode: set\n\
         {pkg}/func1.go:5.23,5.24 1 1\n\
         {pkg}/func3.go:5.18,7.2 1 1\n",
        pkg = common::PACKAGE
    );
    let (coverage, xml) = common::run(profile.as_bytes(), &Config::default());

    let pkg = &coverage.packages[0];
    assert_eq!(
        class_layout(&pkg.classes),
        vec![
            ("-", "testdata/func1.go", vec!["Func1"]),
            ("-", "testdata/func3.go", vec!["Func3"]),
        ]
    );
    assert_eq!(pkg.classes[0].lines, lines(&[(5, 1)]));
    assert_eq!(pkg.classes[1].lines, lines(&[(5, 1), (6, 1), (7, 1)]));
    assert_eq!(xml.matches(r#"<class name="-" "#).count(), 2);
    assert!(xml.contains(r#"<class name="-" filename="testdata/func3.go" line-rate="1""#));
}

#[test]
fn receiver_split_across_files_gets_a_class_per_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("go.mod"), "module example.com/split\n\ngo 1.21\n").unwrap();
    std::fs::create_dir(dir.path().join("store")).unwrap();
    std::fs::write(
        dir.path().join("store/a.go"),
        "package store\n\ntype Store struct{}\n\nfunc (s *Store) Get() int {\n\treturn 1\n}\n",
    )
    .unwrap();
    let put = "package store\n\nfunc (s *Store) Put() {\n}\n";
    std::fs::write(dir.path().join("store/b.go"), put).unwrap();

    let profile = b"mode: set\n\
        example.com/split/store/a.go:5.27,7.2 1 1\n\
        example.com/split/store/b.go:3.23,4.2 0 0\n";
    let resolver = GoModResolver::new(dir.path()).unwrap();
    let mut out = Vec::new();
    let coverage =
        convert_at(&mut &profile[..], &mut out, &Config::default(), &resolver, 0).unwrap();

    let pkg = &coverage.packages[0];
    assert_eq!(pkg.name, "example.com/split/store");
    assert_eq!(
        class_layout(&pkg.classes),
        vec![
            ("Store", "store/a.go", vec!["Get"]),
            ("Store", "store/b.go", vec!["Put"]),
        ]
    );
    assert_eq!(pkg.classes[0].lines, lines(&[(5, 1), (6, 1), (7, 1)]));
    assert_eq!(pkg.classes[1].lines, lines(&[(3, 0), (4, 0)]));
}

#[test]
fn ignore_dirs_drops_whole_package() {
    let config = Config {
        ignore: Ignore::new(Some("testdata$"), None, false).unwrap(),
        ..Default::default()
    };
    let (coverage, xml) = common::run(PROFILE, &config);
    assert!(coverage.packages.is_empty());
    assert!(!xml.contains("<packages"));
}

#[test]
fn by_files_grouping() {
    let config = Config {
        grouping: Grouping::File,
        ..filtered_config()
    };
    let (coverage, _) = common::run(PROFILE, &config);

    let pkg = &coverage.packages[0];
    let names: Vec<&str> = pkg.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["testdata.func1.go", "testdata.func2.go"]);
    assert_eq!(pkg.classes[1].filename, "testdata/func2.go");
    assert_eq!(pkg.classes[1].methods.len(), 3);
    assert_eq!(coverage.lines_valid, 12);
}

#[test]
fn count_mode_sums_overlapping_lines() {
    let profile = format!(
        "mode: count\n\
         {pkg}/func2.go:8.34,9.16 1 3\n\
         {pkg}/func2.go:9.16,11.3 1 2\n",
        pkg = common::PACKAGE
    );
    let (coverage, _) = common::run(profile.as_bytes(), &Config::default());

    let type1 = &coverage.packages[0].classes[0];
    assert_eq!(method(type1, "Func2a").lines, lines(&[(8, 3), (9, 5), (10, 2), (11, 2)]));
    // Methods with no blocks still appear, without lines.
    assert!(method(type1, "Func2b").lines.is_empty());
}

#[test]
fn mode_only_profile_yields_empty_report() {
    let (coverage, xml) = common::run(b"mode: set\n", &Config::default());
    assert!(coverage.packages.is_empty());
    assert!(coverage.sources.is_empty());
    assert_eq!(coverage.line_rate, 0.0);
    assert!(!xml.contains("<sources"));
    assert!(!xml.contains("<packages"));
}

#[test]
fn bad_mode_line_writes_nothing() {
    let mut out = Vec::new();
    let err = convert_at(
        &mut &b"set\nfoo.go:1.1,2.2 1 1\n"[..],
        &mut out,
        &Config::default(),
        &common::resolver(),
        common::TIMESTAMP,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Format(ref line) if line == "set"));
    assert!(out.is_empty());
}

struct NoModule;

impl ModuleResolver for NoModule {
    fn resolve(
        &self,
        package_ids: &[String],
    ) -> gocov_cobertura::error::Result<Vec<ResolvedPackage>> {
        Ok(package_ids
            .iter()
            .map(|id| ResolvedPackage {
                id: id.clone(),
                go_files: Vec::new(),
                module: None,
            })
            .collect())
    }
}

#[test]
fn package_without_module_is_an_error() {
    let mut out = Vec::new();
    let err =
        convert_at(&mut &*PROFILE, &mut out, &Config::default(), &NoModule, 0).unwrap_err();
    assert!(matches!(err, Error::ModuleResolutionRequired(_)));
    assert!(out.is_empty());
}

#[test]
fn package_outside_module_is_an_error() {
    let profile = b"mode: set\nexample.org/other/pkg/a.go:1.1,2.2 1 1\n";
    let mut out = Vec::new();
    let err = convert_at(
        &mut &profile[..],
        &mut out,
        &Config::default(),
        &common::resolver(),
        0,
    )
    .unwrap_err();
    match err {
        Error::ModuleResolutionRequired(name) => assert_eq!(name, "example.org/other/pkg/a.go"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_source_file_is_a_read_error() {
    let profile = format!("mode: set\n{}/gone.go:1.1,2.2 1 1\n", common::PACKAGE);
    let mut out = Vec::new();
    let err = convert_at(
        &mut profile.as_bytes(),
        &mut out,
        &Config::default(),
        &common::resolver(),
        0,
    )
    .unwrap_err();
    assert!(matches!(err, Error::SourceRead { .. }));
}
