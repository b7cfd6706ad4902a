use std::fmt;

/// Canonical unit categories. `Other` carries an unrecognized raw unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Unit {
    Unidades,
    Gramos,
    Kilogramos,
    Mililitros,
    Litros,
    Rollos,
    Hojas,
    Onzas,
    Libras,
    Bolsas,
    Galones,
    Centimetros,
    Metros,
    Xl,
    Other(String),
}

impl Unit {
    pub fn as_str(&self) -> &str {
        match self {
            Unit::Unidades => "unidades",
            Unit::Gramos => "gramos",
            Unit::Kilogramos => "kilogramos",
            Unit::Mililitros => "mililitros",
            Unit::Litros => "litros",
            Unit::Rollos => "rollos",
            Unit::Hojas => "hojas",
            Unit::Onzas => "onzas",
            Unit::Libras => "libras",
            Unit::Bolsas => "bolsas",
            Unit::Galones => "galones",
            Unit::Centimetros => "centimetros",
            Unit::Metros => "metros",
            Unit::Xl => "xl",
            Unit::Other(raw) => raw,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct UnitCategory {
    pub unit: Unit,
    pub variants: &'static [&'static str],
}

/// Table order matters: the first category listing a variant claims it.
pub static UNIT_CATALOG: &[UnitCategory] = &[
    UnitCategory {
        unit: Unit::Unidades,
        variants: &[
            "un", "und", "unds", "uni", "unid", "unids", "unidad", "unidades", "u", "p", "pz",
            "pza", "pzas", "sobre", "sobres", "s", "paq", "paquetes",
        ],
    },
    UnitCategory { unit: Unit::Gramos, variants: &["g", "gr", "grs", "gramos", "gramo", "gs"] },
    UnitCategory { unit: Unit::Kilogramos, variants: &["kg", "kilos", "kilo", "k"] },
    UnitCategory { unit: Unit::Mililitros, variants: &["ml", "cc"] },
    UnitCategory { unit: Unit::Litros, variants: &["l", "lt", "lts", "litros", "litro"] },
    UnitCategory { unit: Unit::Rollos, variants: &["r", "rollo", "rollos", "rll", "rlls"] },
    UnitCategory { unit: Unit::Hojas, variants: &["h", "hj", "hoja", "hojas"] },
    UnitCategory { unit: Unit::Onzas, variants: &["oz", "onz"] },
    UnitCategory { unit: Unit::Libras, variants: &["lb", "lbs", "libra", "libras"] },
    UnitCategory { unit: Unit::Bolsas, variants: &["bol", "bolsa", "bolsas"] },
    UnitCategory { unit: Unit::Galones, variants: &["gal"] },
    UnitCategory { unit: Unit::Centimetros, variants: &["cm"] },
    UnitCategory { unit: Unit::Metros, variants: &["m", "mts", "metro", "metros"] },
    UnitCategory { unit: Unit::Xl, variants: &["xl", "extra grande", "extra-large"] },
];

fn first_category<'a>(table: &'a [UnitCategory], raw: &str) -> Option<&'a UnitCategory> {
    table.iter().find(|c| c.variants.contains(&raw))
}

/// Maps a raw unit string to its canonical category. Unknown strings pass
/// through as `Unit::Other`.
pub fn normalize_unit(raw: &str) -> Unit {
    let lower = raw.trim().to_lowercase();
    match first_category(UNIT_CATALOG, &lower) {
        Some(category) => category.unit.clone(),
        None => Unit::Other(lower),
    }
}

pub fn is_unit_variant(token: &str) -> bool {
    first_category(UNIT_CATALOG, token).is_some()
}

/// True for variants of the implicit singular-count category.
pub fn is_count_variant(token: &str) -> bool {
    matches!(
        first_category(UNIT_CATALOG, token),
        Some(UnitCategory { unit: Unit::Unidades, .. })
    )
}
