//! # Módulo de Solicitudes
//!
//! Este módulo define las solicitudes de servicio que llegan al taller,
//! las categorías fijas de servicio que atiende cada estación y los
//! clientes que las originan.

use std::fmt;

use rand::Rng;

/// Categorías fijas de servicio que atiende el taller.
///
/// Cada categoría corresponde exactamente a una estación: el despachador
/// enruta cada solicitud según este valor y una estación nunca atiende
/// solicitudes de otra categoría.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceCategory {
    /// Revisión técnica del vehículo
    Inspection,
    /// Cambio y balanceo de llantas
    TireService,
    /// Reparación de carrocería
    BodyRepair,
    /// Reparación de motor
    EngineRepair,
}

impl ServiceCategory {
    /// Todas las categorías, en el orden en que se crean las estaciones.
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Inspection,
        ServiceCategory::TireService,
        ServiceCategory::BodyRepair,
        ServiceCategory::EngineRepair,
    ];

    /// Nombre legible de la categoría para logs y reportes.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Inspection => "Revisión técnica",
            ServiceCategory::TireService => "Cambio de llantas",
            ServiceCategory::BodyRepair => "Carrocería",
            ServiceCategory::EngineRepair => "Motor",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const NAMES: [&str; 10] = [
    "Carlos", "María", "José", "Lucía", "Andrés",
    "Valentina", "Diego", "Camila", "Fernando", "Sofía",
];

const SURNAMES: [&str; 10] = [
    "Ramírez", "González", "Mora", "Castro", "Vargas",
    "Jiménez", "Rojas", "Solano", "Herrera", "Campos",
];

/// Cliente que origina una o más solicitudes de servicio.
///
/// El nombre se sortea de listas fijas; solo se usa para el registro de
/// clientes en los reportes, no afecta el enrutamiento ni las métricas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Client {
    pub name: &'static str,
    pub surname: &'static str,
}

impl Client {
    /// Sortea un cliente con nombre y apellido aleatorios.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            name: NAMES[rng.random_range(0..NAMES.len())],
            surname: SURNAMES[rng.random_range(0..SURNAMES.len())],
        }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.surname, self.name)
    }
}

/// Mecánico asignado a una estación.
///
/// El nombre se sortea de las mismas listas fijas que los clientes, una
/// sola vez al crear la estación; solo aparece en la nómina del reporte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mechanic {
    pub name: &'static str,
    pub surname: &'static str,
}

impl Mechanic {
    /// Sortea un mecánico con nombre y apellido aleatorios.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            name: NAMES[rng.random_range(0..NAMES.len())],
            surname: SURNAMES[rng.random_range(0..SURNAMES.len())],
        }
    }
}

impl fmt::Display for Mechanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.surname, self.name)
    }
}

/// Una unidad de trabajo: un cliente que pide un servicio de una categoría.
///
/// Es inmutable una vez creada. El despachador la posee hasta entregarla a
/// la cola de una estación; a partir de ahí pertenece a esa estación hasta
/// ser procesada o descartada al cierre.
#[derive(Clone, Debug)]
pub struct Request {
    /// Cliente que solicita el servicio
    pub client: Client,
    /// Categoría que determina la estación destino
    pub category: ServiceCategory,
}

impl Request {
    /// Crea una nueva solicitud.
    ///
    /// # Arguments
    ///
    /// * `client` - Cliente que origina la solicitud
    /// * `category` - Categoría de servicio solicitada
    pub fn new(client: Client, category: ServiceCategory) -> Self {
        Self { client, category }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_categories_are_distinct() {
        for (i, a) in ServiceCategory::ALL.iter().enumerate() {
            for b in ServiceCategory::ALL.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_random_client_uses_fixed_pools() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let client = Client::random(&mut rng);
            assert!(NAMES.contains(&client.name));
            assert!(SURNAMES.contains(&client.surname));
        }
    }

    #[test]
    fn test_random_mechanic_uses_fixed_pools() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..50 {
            let mechanic = Mechanic::random(&mut rng);
            assert!(NAMES.contains(&mechanic.name));
            assert!(SURNAMES.contains(&mechanic.surname));
        }
    }

    #[test]
    fn test_display_formats() {
        let client = Client { name: "Carlos", surname: "Mora" };
        assert_eq!(format!("{}", client), "Mora Carlos");
        assert_eq!(format!("{}", ServiceCategory::EngineRepair), "Motor");
    }
}
