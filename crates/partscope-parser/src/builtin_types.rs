//! Names from the standard model libraries that may be used as types
//! without being declared in the model.
//!
//! They carry no features, so they never contribute to feature lookup; the
//! loader simply accepts them where a typing or specialization is expected.

use partscope_core::identifier::Id;

/// Library packages whose members are accepted by their simple name after
/// an `import`, or qualified with the package name.
const LIBRARY: &[(&str, &[&str])] = &[
    ("Base", &["Anything", "DataValue"]),
    (
        "ScalarValues",
        &[
            "ScalarValue",
            "NumericalValue",
            "Number",
            "Real",
            "Rational",
            "Integer",
            "Natural",
            "Positive",
            "Complex",
            "Boolean",
            "String",
        ],
    ),
    (
        "ISQ",
        &[
            "MassValue",
            "LengthValue",
            "DurationValue",
            "TimeValue",
            "SpeedValue",
            "AccelerationValue",
            "ForceValue",
            "PowerValue",
            "EnergyValue",
            "AreaValue",
            "VolumeValue",
            "TemperatureValue",
            "ThermodynamicTemperatureValue",
            "ElectricCurrentValue",
            "FrequencyValue",
            "PressureValue",
        ],
    ),
    ("Parts", &["Part"]),
    ("Items", &["Item"]),
];

/// `true` if `path` names a library type, either as `Real` or as
/// `ScalarValues::Real`.
pub fn is_builtin(path: &[Id]) -> bool {
    match path {
        [name] => LIBRARY
            .iter()
            .any(|(_, members)| members.iter().any(|member| *name == **member)),
        [package, name] => LIBRARY.iter().any(|(library, members)| {
            *package == **library && members.iter().any(|member| *name == **member)
        }),
        _ => false,
    }
}
