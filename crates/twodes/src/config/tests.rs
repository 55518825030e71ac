use test_case::test_case;

use super::*;

#[test]
fn config() {
    let got = Config::load("testfiles/twodes.toml").unwrap();
    let want = Config::new(8, 4000, [128, 0, 128], Technique::Full)
        .dt1(2)
        .deltat(20.0)
        .sample(100)
        .lifetime(500.0)
        .propagation(Mode::Coupling)
        .hamiltonian(HamiltonianKind::Coupling)
        .threshold(0.001)
        .trotter(5)
        .window(1500.0, 1800.0)
        .output_dir("out".to_owned());
    assert_eq!(got, want);
    assert_eq!(got.shift(), 1650.0);
    assert_eq!(got.cluster_filter(), None);
    assert!(got.reads_doubles());
}

const MINIMAL: &str = r#"
singles = 2
length = 100
tmax1 = 4
tmax2 = 2
tmax3 = 4
deltat = 2.0
sample = 10
lifetime = 300.0
"#;

fn parse(extra: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(&format!("{MINIMAL}{extra}"))
}

#[test_case("propagation = 0\ntechnique = \"gb\"", Mode::Diagonal, Technique::Bleach)]
#[test_case("propagation = 1\ntechnique = \"noEAUVvis\"", Mode::Coupling, Technique::NoAbsorption)]
#[test_case("propagation = \"sparse\"\ntechnique = \"ea\"", Mode::Diagonal, Technique::Absorption)]
#[test_case("propagation = \"Coupling\"\ntechnique = \"SEUVvis\"", Mode::Coupling, Technique::Emission)]
fn selectors(extra: &str, mode: Mode, technique: Technique) {
    let got = parse(extra).unwrap();
    assert_eq!(got.propagation, mode);
    assert_eq!(got.technique, technique);
    assert_eq!(got.output_dir, ".");
    assert_eq!(got.energy_file, "Energy.bin");
    assert_eq!(got.cluster, -1);
}

#[test_case("propagation = 2\ntechnique = \"gb\""; "bad index")]
#[test_case("propagation = 0\ntechnique = \"IR\""; "bad technique")]
#[test_case("propagation = 0\ntechnique = \"gb\"\nfoo = 1"; "unknown field")]
fn rejected(extra: &str) {
    assert!(parse(extra).is_err());
}

#[test]
fn capabilities() {
    use Technique::*;
    let got: Vec<_> = [Full, Bleach, Emission, Absorption, NoAbsorption]
        .into_iter()
        .map(|t| (t.bleach(), t.emission(), t.absorption(), t.needs_doubles()))
        .collect();
    assert_eq!(
        got,
        vec![
            (true, true, true, true),
            (true, false, false, false),
            (false, true, false, false),
            (false, false, true, true),
            (true, true, false, false),
        ]
    );
}

#[test]
fn constant_anharmonicity() {
    let c = Config::new(2, 100, [4, 2, 4], Technique::Full);
    assert!(c.reads_doubles());
    assert!(!c.clone().anharmonicity(15.0).reads_doubles());
    assert!(!c.technique(Technique::NoAbsorption).reads_doubles());
}

fn base() -> Config {
    Config::new(2, 100, [4, 2, 4], Technique::Full)
}

#[test_case(base().dt3(0); "zero stride")]
#[test_case(base().trotter(0); "zero trotter")]
#[test_case(base().lifetime(0.0); "zero lifetime")]
#[test_case(base().deltat(-1.0); "negative deltat")]
#[test_case(base().begin(5).end(3); "backwards range")]
#[test_case(Config::new(0, 100, [4, 2, 4], Technique::Full); "no states")]
#[test_case(Config::new(2, 100, [0, 2, 4], Technique::Full); "empty t1")]
fn invalid(c: Config) {
    assert!(matches!(c.validate(), Err(Error::Config(_))));
}

#[test]
fn missing_file() {
    let got = Config::load("testfiles/nonexistent.toml");
    assert!(matches!(got, Err(Error::Config(_))));
}
