use chrono::Weekday;

/// A department and the localities suppliers can deliver to within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Department {
    pub name: &'static str,
    pub localities: &'static [&'static str],
}

impl Department {
    pub fn has_locality(&self, locality: &str) -> bool {
        self.localities.contains(&locality)
    }
}

/// Departments of Uruguay with the localities served by the network.
pub const URUGUAY: &[Department] = &[
    Department {
        name: "Artigas",
        localities: &["Artigas", "Bella Unión", "Tomás Gomensoro", "Baltasar Brum"],
    },
    Department {
        name: "Canelones",
        localities: &[
            "Canelones",
            "Las Piedras",
            "Pando",
            "Ciudad de la Costa",
            "Progreso",
            "Santa Lucía",
            "Sauce",
            "Tala",
        ],
    },
    Department {
        name: "Cerro Largo",
        localities: &["Melo", "Río Branco", "Fraile Muerto", "Isidoro Noblía"],
    },
    Department {
        name: "Colonia",
        localities: &[
            "Colonia del Sacramento",
            "Carmelo",
            "Nueva Helvecia",
            "Juan Lacaze",
            "Rosario",
            "Nueva Palmira",
        ],
    },
    Department {
        name: "Durazno",
        localities: &["Durazno", "Sarandí del Yí", "Villa del Carmen"],
    },
    Department {
        name: "Flores",
        localities: &["Trinidad", "Ismael Cortinas"],
    },
    Department {
        name: "Florida",
        localities: &["Florida", "Sarandí Grande", "Casupá", "Fray Marcos"],
    },
    Department {
        name: "Lavalleja",
        localities: &["Minas", "José Pedro Varela", "Solís de Mataojo"],
    },
    Department {
        name: "Maldonado",
        localities: &[
            "Maldonado",
            "Punta del Este",
            "San Carlos",
            "Piriápolis",
            "Pan de Azúcar",
        ],
    },
    Department {
        name: "Montevideo",
        localities: &[
            "Aguada", "Centro", "Pocitos", "Carrasco", "Prado", "Cerro", "Colón", "Malvín",
            "Unión", "La Teja",
        ],
    },
    Department {
        name: "Paysandú",
        localities: &["Paysandú", "Guichón", "Quebracho"],
    },
    Department {
        name: "Río Negro",
        localities: &["Fray Bentos", "Young", "Nuevo Berlín"],
    },
    Department {
        name: "Rivera",
        localities: &["Rivera", "Vichadero", "Tranqueras", "Minas de Corrales"],
    },
    Department {
        name: "Rocha",
        localities: &["Rocha", "Chuy", "Castillos", "Lascano", "La Paloma"],
    },
    Department {
        name: "Salto",
        localities: &["Salto", "Constitución", "Belén"],
    },
    Department {
        name: "San José",
        localities: &["San José de Mayo", "Ciudad del Plata", "Libertad", "Rodríguez"],
    },
    Department {
        name: "Soriano",
        localities: &["Mercedes", "Dolores", "Cardona"],
    },
    Department {
        name: "Tacuarembó",
        localities: &["Tacuarembó", "Paso de los Toros", "San Gregorio de Polanco"],
    },
    Department {
        name: "Treinta y Tres",
        localities: &["Treinta y Tres", "Vergara", "Santa Clara de Olimar"],
    },
];

/// Default product categories offered in the catalog.
pub const CATEGORIES: &[&str] = &[
    "Arroz", "Azúcar", "Refrescos", "Lácteos", "Limpieza", "Aceites", "Harinas", "Snacks",
];

/// Week in delivery order, Monday first.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Look up a department by exact name.
pub fn department(name: &str) -> Option<&'static Department> {
    URUGUAY.iter().find(|d| d.name == name)
}

pub fn is_known_department(name: &str) -> bool {
    department(name).is_some()
}

/// True if `locality` is listed under `department`.
pub fn is_known_locality(department_name: &str, locality: &str) -> bool {
    department(department_name).is_some_and(|d| d.has_locality(locality))
}

/// Spanish day name, as shown on delivery schedules.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lunes",
        Weekday::Tue => "Martes",
        Weekday::Wed => "Miércoles",
        Weekday::Thu => "Jueves",
        Weekday::Fri => "Viernes",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

/// Parse a Spanish day name. Case and accents are ignored.
pub fn parse_day(name: &str) -> Option<Weekday> {
    let folded = fold(name.trim());
    WEEK.into_iter().find(|d| fold(day_name(*d)) == folded)
}

/// Lowercase and strip Spanish accents. `ñ` stays a letter of its own.
pub(crate) fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}
