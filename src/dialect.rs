//! Target dialects.
//!
//! A dialect describes the builtin functions available to code and selects
//! the finishing step run at the end of the optimiser suite.

use std::collections::{BTreeMap, BTreeSet};

use malachite::num::arithmetic::traits::{
    ModPowerOf2, ModPowerOf2Add, ModPowerOf2Mul, ModPowerOf2Sub, PowerOf2,
};
use malachite::num::basic::traits::{One, Zero};
use malachite::Natural;
use strum_macros::{Display, EnumString};

use crate::yul::ast::{Name, WORD_BITS};

/// Evaluates a builtin on constant arguments.
pub type Folder = fn(&[Natural]) -> Option<Natural>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DialectKind {
    /// Word-oriented target whose literals are costed by a gas meter.
    Evm,
    /// Module-structured target.
    Wasm,
    /// Target without a finishing step.
    Generic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    Memory,
    Storage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Load(Location),
    Store(Location),
}

#[derive(Clone, Debug)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub parameters: usize,
    pub returns: usize,
    /// Free of side effects and independent of state; may be moved,
    /// duplicated or removed.
    pub movable: bool,
    /// May be removed if the result is unused.
    pub side_effect_free: bool,
    /// Never returns control to the caller.
    pub terminates: bool,
    pub access: Option<Access>,
    pub fold: Option<Folder>,
}

impl BuiltinFunction {
    fn pure(name: &'static str, parameters: usize, fold: Folder) -> Self {
        BuiltinFunction {
            name,
            parameters,
            returns: 1,
            movable: true,
            side_effect_free: true,
            terminates: false,
            access: None,
            fold: Some(fold),
        }
    }

    fn environment(name: &'static str) -> Self {
        BuiltinFunction {
            name,
            parameters: 0,
            returns: 1,
            movable: true,
            side_effect_free: true,
            terminates: false,
            access: None,
            fold: None,
        }
    }

    fn load(name: &'static str, location: Location) -> Self {
        BuiltinFunction {
            name,
            parameters: 1,
            returns: 1,
            movable: false,
            side_effect_free: true,
            terminates: false,
            access: Some(Access::Load(location)),
            fold: None,
        }
    }

    fn store(name: &'static str, location: Location) -> Self {
        BuiltinFunction {
            name,
            parameters: 2,
            returns: 0,
            movable: false,
            side_effect_free: false,
            terminates: false,
            access: Some(Access::Store(location)),
            fold: None,
        }
    }

    fn effect(name: &'static str, parameters: usize, returns: usize) -> Self {
        BuiltinFunction {
            name,
            parameters,
            returns,
            movable: false,
            side_effect_free: false,
            terminates: false,
            access: None,
            fold: None,
        }
    }

    fn terminator(name: &'static str, parameters: usize) -> Self {
        BuiltinFunction {
            terminates: true,
            ..BuiltinFunction::effect(name, parameters, 0)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Dialect {
    kind: DialectKind,
    builtins: BTreeMap<&'static str, BuiltinFunction>,
    boolean_negation: Option<&'static str>,
    equality: Option<&'static str>,
    discard: Option<&'static str>,
    stack_limit: Option<usize>,
}

impl Dialect {
    pub fn new(kind: DialectKind) -> Dialect {
        match kind {
            DialectKind::Evm => Dialect {
                stack_limit: Some(16),
                ..Dialect::word(kind)
            },
            DialectKind::Wasm => Dialect::wasm(),
            DialectKind::Generic => Dialect::word(kind),
        }
    }

    pub fn evm() -> Dialect {
        Dialect::new(DialectKind::Evm)
    }

    pub fn generic() -> Dialect {
        Dialect::new(DialectKind::Generic)
    }

    fn word(kind: DialectKind) -> Dialect {
        let builtins = [
            BuiltinFunction::pure("add", 2, fold_add),
            BuiltinFunction::pure("sub", 2, fold_sub),
            BuiltinFunction::pure("mul", 2, fold_mul),
            BuiltinFunction::pure("div", 2, fold_div),
            BuiltinFunction::pure("mod", 2, fold_mod),
            BuiltinFunction::pure("not", 1, fold_not),
            BuiltinFunction::pure("lt", 2, fold_lt),
            BuiltinFunction::pure("gt", 2, fold_gt),
            BuiltinFunction::pure("eq", 2, fold_eq),
            BuiltinFunction::pure("iszero", 1, fold_iszero),
            BuiltinFunction::pure("and", 2, fold_and),
            BuiltinFunction::pure("or", 2, fold_or),
            BuiltinFunction::pure("xor", 2, fold_xor),
            BuiltinFunction::pure("shl", 2, fold_shl),
            BuiltinFunction::pure("shr", 2, fold_shr),
            BuiltinFunction::environment("caller"),
            BuiltinFunction::environment("callvalue"),
            BuiltinFunction::environment("address"),
            BuiltinFunction {
                parameters: 1,
                ..BuiltinFunction::environment("calldataload")
            },
            BuiltinFunction::environment("calldatasize"),
            BuiltinFunction::load("mload", Location::Memory),
            BuiltinFunction::store("mstore", Location::Memory),
            BuiltinFunction::load("sload", Location::Storage),
            BuiltinFunction::store("sstore", Location::Storage),
            BuiltinFunction {
                side_effect_free: true,
                ..BuiltinFunction::effect("keccak256", 2, 1)
            },
            BuiltinFunction {
                side_effect_free: true,
                ..BuiltinFunction::effect("gas", 0, 1)
            },
            BuiltinFunction::effect("call", 7, 1),
            BuiltinFunction::effect("log1", 3, 0),
            BuiltinFunction {
                movable: true,
                side_effect_free: true,
                ..BuiltinFunction::effect("pop", 1, 0)
            },
            BuiltinFunction::terminator("return", 2),
            BuiltinFunction::terminator("revert", 2),
            BuiltinFunction::terminator("stop", 0),
            BuiltinFunction::terminator("invalid", 0),
        ];

        Dialect {
            kind,
            builtins: builtins.into_iter().map(|b| (b.name, b)).collect(),
            boolean_negation: Some("iszero"),
            equality: Some("eq"),
            discard: Some("pop"),
            stack_limit: None,
        }
    }

    pub fn wasm() -> Dialect {
        let arithmetic = |name| BuiltinFunction {
            fold: None,
            ..BuiltinFunction::pure(name, 2, fold_add)
        };

        let builtins = [
            arithmetic("i64.add"),
            arithmetic("i64.sub"),
            arithmetic("i64.mul"),
            arithmetic("i64.and"),
            arithmetic("i64.or"),
            arithmetic("i64.eq"),
            arithmetic("i64.lt_u"),
            arithmetic("i64.gt_u"),
            BuiltinFunction {
                parameters: 1,
                ..arithmetic("i64.eqz")
            },
            BuiltinFunction::load("i64.load", Location::Memory),
            BuiltinFunction::store("i64.store", Location::Memory),
            BuiltinFunction {
                movable: true,
                side_effect_free: true,
                ..BuiltinFunction::effect("drop", 1, 0)
            },
            BuiltinFunction::terminator("unreachable", 0),
        ];

        Dialect {
            kind: DialectKind::Wasm,
            builtins: builtins.into_iter().map(|b| (b.name, b)).collect(),
            boolean_negation: Some("i64.eqz"),
            equality: Some("i64.eq"),
            discard: Some("drop"),
            stack_limit: None,
        }
    }

    pub fn kind(&self) -> DialectKind {
        self.kind
    }

    pub fn builtin(&self, name: &str) -> Option<&BuiltinFunction> {
        self.builtins.get(name)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    pub fn builtins(&self) -> impl Iterator<Item = &BuiltinFunction> {
        self.builtins.values()
    }

    /// Names no user code may declare.
    pub fn fixed_function_names(&self) -> BTreeSet<Name> {
        self.builtins.keys().map(|name| name.to_string()).collect()
    }

    pub fn boolean_negation(&self) -> Option<&'static str> {
        self.boolean_negation
    }

    pub fn equality(&self) -> Option<&'static str> {
        self.equality
    }

    /// Builtin consuming a single value without effect.
    pub fn discard(&self) -> Option<&'static str> {
        self.discard
    }

    /// Number of variable slots reachable by the code generator.
    pub fn stack_limit(&self) -> Option<usize> {
        self.stack_limit
    }
}

fn word_mask() -> Natural {
    Natural::power_of_2(WORD_BITS) - Natural::ONE
}

fn from_bool(value: bool) -> Natural {
    if value {
        Natural::ONE
    } else {
        Natural::ZERO
    }
}

fn shift_amount(value: &Natural) -> Option<u64> {
    u64::try_from(value).ok().filter(|&shift| shift < WORD_BITS)
}

fn fold_add(args: &[Natural]) -> Option<Natural> {
    Some(args[0].clone().mod_power_of_2_add(args[1].clone(), WORD_BITS))
}

fn fold_sub(args: &[Natural]) -> Option<Natural> {
    Some(args[0].clone().mod_power_of_2_sub(args[1].clone(), WORD_BITS))
}

fn fold_mul(args: &[Natural]) -> Option<Natural> {
    Some(args[0].clone().mod_power_of_2_mul(args[1].clone(), WORD_BITS))
}

fn fold_div(args: &[Natural]) -> Option<Natural> {
    if args[1] == Natural::ZERO {
        Some(Natural::ZERO)
    } else {
        Some(&args[0] / &args[1])
    }
}

fn fold_mod(args: &[Natural]) -> Option<Natural> {
    if args[1] == Natural::ZERO {
        Some(Natural::ZERO)
    } else {
        Some(&args[0] % &args[1])
    }
}

fn fold_not(args: &[Natural]) -> Option<Natural> {
    Some(word_mask() - &args[0])
}

fn fold_lt(args: &[Natural]) -> Option<Natural> {
    Some(from_bool(args[0] < args[1]))
}

fn fold_gt(args: &[Natural]) -> Option<Natural> {
    Some(from_bool(args[0] > args[1]))
}

fn fold_eq(args: &[Natural]) -> Option<Natural> {
    Some(from_bool(args[0] == args[1]))
}

fn fold_iszero(args: &[Natural]) -> Option<Natural> {
    Some(from_bool(args[0] == Natural::ZERO))
}

fn fold_and(args: &[Natural]) -> Option<Natural> {
    Some(&args[0] & &args[1])
}

fn fold_or(args: &[Natural]) -> Option<Natural> {
    Some(&args[0] | &args[1])
}

fn fold_xor(args: &[Natural]) -> Option<Natural> {
    Some(&args[0] ^ &args[1])
}

fn fold_shl(args: &[Natural]) -> Option<Natural> {
    Some(match shift_amount(&args[0]) {
        Some(shift) => (&args[1] << shift).mod_power_of_2(WORD_BITS),
        None => Natural::ZERO,
    })
}

fn fold_shr(args: &[Natural]) -> Option<Natural> {
    Some(match shift_amount(&args[0]) {
        Some(shift) => &args[1] >> shift,
        None => Natural::ZERO,
    })
}
