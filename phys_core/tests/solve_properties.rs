//! End-to-end solve scenarios against the public API.

use phys_core::{
    solve_equation, solve_text, BareNumberPolicy, Equation, PhysError, Solution, SolverSettings,
    UnitSystem, VariableStore,
};

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn solve(text: &str, knowns: &[(&str, &str)]) -> Result<Solution, PhysError> {
    solve_text(
        text,
        knowns.iter().copied(),
        UnitSystem::standard(),
        &SolverSettings::default(),
    )
}

/// `<var> = <number> <unit>`, the number written like `20.0` or `1.8e+17`
fn matches_result_shape(rendered: &str) -> bool {
    let Some((var, rest)) = rendered.split_once(" = ") else {
        return false;
    };
    let Some((number, unit)) = rest.split_once(' ') else {
        return false;
    };
    !var.is_empty()
        && var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && number.parse::<f64>().is_ok()
        && (number.contains('.') || number.contains('e'))
        && !unit.trim().is_empty()
}

#[test]
fn newtons_second_law_reports_newtons() {
    let solution = solve("f = m * a", &[("m", "10 kg"), ("a", "2 m/s^2")]).unwrap();
    assert_eq!(solution.unknown, "f");
    assert_eq!(solution.value, 20.0);
    assert_eq!(solution.to_string(), "f = 20.0 newton");
}

#[test]
fn scientific_notation_stays_in_the_number() {
    let eq = Equation::parse("e = m * v^2").unwrap();
    assert_eq!(eq.variables, vec!["e", "m", "v"]);

    let store = VariableStore::build(
        [("m", "2 kg"), ("v", "3e8 m/s")],
        UnitSystem::standard(),
        &SolverSettings::default(),
    )
    .unwrap();
    assert_eq!(store.get_converted("v"), Some((3e8, "meter / second")));

    let solution = solve("e = m * v^2", &[("m", "2 kg"), ("v", "3e8 m/s")]).unwrap();
    assert!(approx_eq(solution.base_value, 1.8e17));
    assert_eq!(solution.to_string(), "e = 1.8e+17 joule");

    // glued to the unit as well
    let glued = solve("e = m * v^2", &[("m", "2kg"), ("v", "3e8m/s")]).unwrap();
    assert_eq!(glued, solution);
}

#[test]
fn two_unknowns_are_underdetermined() {
    let err = solve("v = i * r", &[("i", "2 ampere")]).unwrap_err();
    assert_eq!(err.error_code(), "UNDERDETERMINED");
    let mut missing = err.variables();
    missing.sort_unstable();
    assert_eq!(missing, vec!["r", "v"]);
    assert!(err.to_string().contains("Multiple unknown variables"));
}

#[test]
fn zero_unknowns_is_an_error() {
    let err = solve(
        "p = e / t",
        &[("e", "100 joule"), ("t", "5 second"), ("p", "20 watt")],
    )
    .unwrap_err();
    assert!(matches!(err, PhysError::Underdetermined { ref missing, .. } if missing.is_empty()));
    assert!(err.to_string().contains("No unknown variable"));
}

#[test]
fn bad_unit_names_variable_and_raw_value() {
    let err = solve("f = m * a", &[("m", "10 kg"), ("a", "2 banana")]).unwrap_err();
    assert_eq!(err.error_code(), "UNIT_ERROR");
    match &err {
        PhysError::Unit { issues } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].variable, "a");
            assert_eq!(issues[0].raw, "2 banana");
        }
        other => panic!("expected a unit error, got {:?}", other),
    }
    let message = err.to_string();
    assert!(message.contains("'a'") && message.contains("2 banana"), "{}", message);
}

#[test]
fn every_bad_known_value_is_reported() {
    let err = solve("f = m * a", &[("m", "ten kg"), ("a", "2 banana")]).unwrap_err();
    assert_eq!(err.variables(), vec!["a", "m"]);
}

#[test]
fn solving_is_idempotent() {
    let knowns = [("e", "100 joule"), ("t", "5 second")];
    let first = solve("p = e / t", &knowns).unwrap();
    let second = solve("p = e / t", &knowns).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), "p = 20.0 watt");
    assert_eq!(
        solve_equation("p = e / t", knowns),
        solve_equation("p = e / t", knowns)
    );
}

#[test]
fn known_values_round_trip_through_base_units() {
    let inputs = [
        ("s", "12.5 km"),
        ("t", "90 min"),
        ("m", "3.3 lb"),
        ("v", "65 mph"),
        ("e", "7.25 kWh"),
        ("i", "250 mA"),
        ("p", "1.5e-3 MW"),
        ("x", "42 µm"),
    ];
    let store = VariableStore::build(inputs, UnitSystem::standard(), &SolverSettings::default()).unwrap();
    for (name, _) in inputs {
        let known = store.get_original(name).unwrap();
        assert!(
            approx_eq(known.magnitude_from_base(), known.magnitude),
            "{}: {} -> {}",
            name,
            known.magnitude,
            known.magnitude_from_base()
        );
    }
}

#[test]
fn results_have_the_documented_shape() {
    let cases: [(&str, &[(&str, &str)]); 6] = [
        ("f = m * a", &[("m", "10 kg"), ("a", "2 m/s^2")]),
        ("v = i * r", &[("i", "2A"), ("r", "5ohm")]),
        ("p = e / t", &[("e", "1 kWh"), ("t", "1 h")]),
        ("a = f / m", &[("f", "1 lbf"), ("m", "1 lb")]),
        ("v = s / t", &[("s", "100 m"), ("t", "9.58 s")]),
        ("y = sqrt(x) * k", &[("x", "16"), ("k", "3")]),
    ];
    for (text, knowns) in cases {
        let rendered = solve_equation(text, knowns.iter().copied());
        assert!(matches_result_shape(&rendered), "{} -> {}", text, rendered);
    }
}

#[test]
fn bare_numbers_follow_the_policy() {
    let canonical = solve("v = i * r", &[("i", "2"), ("r", "5")]).unwrap();
    assert_eq!(canonical.to_string(), "v = 10.0 volt");

    let strict = SolverSettings {
        bare_numbers: BareNumberPolicy::Reject,
        ..SolverSettings::default()
    };
    let err = solve_text("v = i * r", [("i", "2"), ("r", "5 ohm")], UnitSystem::standard(), &strict)
        .unwrap_err();
    assert_eq!(err.variables(), vec!["i"]);
}

#[test]
fn wrapper_prefixes_errors() {
    let cases: [(&str, &[(&str, &str)]); 4] = [
        ("f m a", &[("m", "1 kg")]),
        ("f = m * a", &[("m", "1 kg"), ("a", "2 banana")]),
        ("v = i * r", &[("i", "2 ampere")]),
        ("x = m + t", &[("m", "1 kg"), ("t", "1 s")]),
    ];
    for (text, knowns) in cases {
        let rendered = solve_equation(text, knowns.iter().copied());
        assert!(rendered.starts_with("Error: "), "{} -> {}", text, rendered);
    }
}

#[test]
fn errors_serialize_with_a_type_tag() {
    let err = solve("v = i * r", &[("i", "2 ampere")]).unwrap_err();
    let json = serde_json::to_value(&err).unwrap();
    assert_eq!(json["type"], "Underdetermined");
    assert_eq!(json["details"]["missing"][0], "v");
}

#[test]
fn unit_symbols_resolve_in_any_case() {
    let solution = solve("p = e / t", &[("e", "1 KWH"), ("t", "1 h")]).unwrap();
    assert_eq!(solution.to_string(), "p = 1000.0 watt");

    let ambiguous = solve("t = 1 / f", &[("f", "2 mhz")]).unwrap_err();
    assert_eq!(ambiguous.error_code(), "UNIT_ERROR");
}

#[test]
fn out_of_range_input_is_an_error_not_infinity() {
    let empty: [(&str, &str); 0] = [];
    let rendered = solve_equation("x = 1e400", empty);
    assert!(rendered.starts_with("Error: "), "{}", rendered);
    assert!(!rendered.contains("inf"), "{}", rendered);

    let overflow = solve("x = l^100 * l^100", &[("l", "1 m")]).unwrap_err();
    assert_eq!(overflow.error_code(), "EVALUATION_ERROR");
}
