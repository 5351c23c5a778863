//! # Simulador de Taller Automotriz
//!
//! Esta biblioteca simula un taller de servicio automotriz con varias
//! estaciones concurrentes: un despachador enruta cada solicitud entrante a
//! la estación de su categoría, y cada estación la procesa con un hilo
//! trabajador propio durante una ventana de tiempo simulado fija, tras la
//! cual deja de aceptar trabajo y reporta ocupación, pérdidas y
//! rentabilidad.
//!
//! ## Características principales
//!
//! - **Productores/consumidor por estación**: cada cola FIFO se comparte
//!   entre los llamadores de `submit` y el único trabajador de la estación,
//!   protegida con `Mutex` + `Condvar` y esperas siempre con timeout.
//! - **Ventana de operación acotada**: el trabajador corre `2 × ventana`
//!   desde su propio arranque (generación más fase de solo procesamiento)
//!   y descarta lo pendiente al vencer el plazo.
//! - **Tiempos de servicio aleatorizados**: duración nominal fija más una
//!   perturbación de cola larga reproducible con semilla (`rand`).
//! - **Analítica posterior**: estimación de solicitudes perdidas,
//!   clasificación de ocupación y recomendación de dotación por estación.
//!
//! ## Estructura del proyecto
//!
//! - `request`: solicitudes, categorías de servicio, clientes y mecánicos
//! - `station`: las estaciones y su bucle trabajador
//! - `dispatcher`: coordinador, enrutamiento, señal de marcha y agregados
//! - `metrics`: formas de datos de reporte y cálculos puros
//! - `generator`: colaborador de llegadas con calendario semanal
//! - `report`: colaborador de presentación y persistencia

pub mod dispatcher;
pub mod generator;
pub mod metrics;
pub mod report;
pub mod request;
pub mod station;

// Re-exportar las estructuras principales para facilitar su uso
pub use dispatcher::{Dispatcher, RoutingError};
pub use generator::RequestGenerator;
pub use metrics::{
    AggregateTotals, EmploymentRate, StaffingAdvice, StationReport, StationSnapshot, WorkerPhase,
};
pub use request::{Client, Mechanic, Request, ServiceCategory};
pub use station::{SimParams, Station, StationConfig};

/// Configuración por defecto del simulador
pub mod config {
    use crate::request::ServiceCategory;
    use crate::station::StationConfig;

    /// Ticks por minuto simulado (1 tick = 0.1 minuto)
    pub const TICKS_PER_MINUTE: u64 = 10;

    /// Ventana de operación por defecto: una semana laboral simulada
    /// (4 560 minutos)
    pub const WEEK_TICKS: u64 = 45_600;

    /// Dotación mínima sorteable o recomendable
    pub const STAFFING_MIN: u32 = 2;

    /// Dotación máxima sorteable o recomendable
    pub const STAFFING_MAX: u32 = 7;

    /// Piso del salario por mecánico
    pub const SALARY_FLOOR: i64 = 7_000;

    /// Configuración de las cuatro estaciones del taller: tarifa, duración
    /// máxima nominal y cota de perturbación por categoría. La dotación se
    /// sortea al crear cada estación.
    pub fn default_station_configs() -> Vec<StationConfig> {
        vec![
            StationConfig {
                category: ServiceCategory::Inspection,
                revenue_per_request: 1_500,
                max_service_minutes: 420,
                perturbation_spread: 360,
                staffing: None,
            },
            StationConfig {
                category: ServiceCategory::TireService,
                revenue_per_request: 3_000,
                max_service_minutes: 560,
                perturbation_spread: 720,
                staffing: None,
            },
            StationConfig {
                category: ServiceCategory::BodyRepair,
                revenue_per_request: 4_500,
                max_service_minutes: 770,
                perturbation_spread: 1_080,
                staffing: None,
            },
            StationConfig {
                category: ServiceCategory::EngineRepair,
                revenue_per_request: 7_500,
                max_service_minutes: 910,
                perturbation_spread: 1_440,
                staffing: None,
            },
        ]
    }
}
