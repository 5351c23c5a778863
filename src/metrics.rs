//! # Módulo de Métricas
//!
//! Este módulo define las formas de datos de solo lectura que consume el
//! colaborador de reportes (instantáneas, informes finales, totales
//! agregados) y los cálculos aritméticos puros del motor: clasificación
//! del nivel de ocupación, estimador de solicitudes perdidas y planilla.
//!
//! Los cálculos viven aquí, separados del hilo trabajador, para poder
//! probarlos sin lanzar ejecución concurrente.

use std::fmt;

use crate::request::ServiceCategory;

/// Nivel de ocupación de una estación sobre su ventana de operación.
///
/// Los cortes son exactos y la igualdad en la frontera favorece el nivel
/// más alto: con tiempo ocupado `b` sobre ventana `W`, es `High` si
/// `2(W−b) ≤ b`, `Middle` si `(W−b) ≤ b`, y `Low` en el resto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmploymentRate {
    Low,
    Middle,
    High,
}

impl EmploymentRate {
    /// Clasifica el nivel de ocupación a partir del tiempo ocupado y la
    /// ventana, ambos en ticks. Es una función total sobre pares no
    /// negativos; un `busy` mayor que la ventana clasifica como `High`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use car_service_simulator::EmploymentRate;
    ///
    /// assert_eq!(EmploymentRate::classify(300, 300), EmploymentRate::High);
    /// assert_eq!(EmploymentRate::classify(0, 300), EmploymentRate::Low);
    /// ```
    pub fn classify(busy_ticks: u64, window_ticks: u64) -> Self {
        let idle = window_ticks.saturating_sub(busy_ticks);
        if 2 * idle <= busy_ticks {
            EmploymentRate::High
        } else if idle <= busy_ticks {
            EmploymentRate::Middle
        } else {
            EmploymentRate::Low
        }
    }
}

impl fmt::Display for EmploymentRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmploymentRate::Low => "BAJA",
            EmploymentRate::Middle => "MEDIA",
            EmploymentRate::High => "ALTA",
        };
        f.write_str(s)
    }
}

/// Fase del bucle trabajador de una estación.
///
/// `Waiting` y `Processing` alternan mientras la ventana sigue abierta;
/// `DrainingStop` descarta lo que quede en cola al vencer el plazo y
/// `Done` es terminal, con el informe final ya publicado.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerPhase {
    Waiting,
    Processing,
    DrainingStop,
    Done,
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerPhase::Waiting => "esperando",
            WorkerPhase::Processing => "procesando",
            WorkerPhase::DrainingStop => "descartando",
            WorkerPhase::Done => "finalizada",
        };
        f.write_str(s)
    }
}

/// Vista de solo lectura de los contadores vivos de una estación.
///
/// Segura de consultar en paralelo con el trabajador; nunca bloquea sobre
/// una cola vacía y es idempotente entre mutaciones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StationSnapshot {
    pub category: ServiceCategory,
    pub staffing: u32,
    pub submitted: u64,
    pub completed: u64,
    pub queued: usize,
    pub busy_ticks: u64,
    /// Tiempo promedio de servicio en minutos simulados (con el respaldo
    /// nominal si aún no se completó nada)
    pub avg_service_minutes: u64,
    pub phase: WorkerPhase,
    pub employment: EmploymentRate,
}

/// Recomendación de dotación para una estación, derivada de la estadística
/// final. Las búsquedas son heurísticas heredadas del modelo: acotadas,
/// deterministas y sin garantía de optimalidad.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StaffingAdvice {
    /// Hubo solicitudes perdidas: conviene subir la dotación.
    Increase {
        /// Cuántos mecánicos agregar
        by: u32,
        /// Dotación resultante
        resulting: u32,
        /// Perdidas proyectadas que aún quedarían con esa dotación
        remaining_lost: u64,
        /// `true` si el tiempo ocioso fue 0 (las pérdidas son seguras,
        /// no solo posibles)
        certain_loss: bool,
    },
    /// Sin pérdidas y ocupación alta: la estación trabaja eficientemente.
    Efficient,
    /// Sin pérdidas pero la búsqueda no halló una dotación menor viable.
    NoChange {
        /// Tiempo de servicio con la dotación actual, en minutos
        service_minutes: u64,
    },
    /// Sin pérdidas y con holgura: conviene bajar la dotación.
    Decrease {
        by: u32,
        resulting: u32,
        /// Tiempo de servicio con la dotación propuesta, en minutos
        service_minutes: u64,
    },
}

impl fmt::Display for StaffingAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaffingAdvice::Increase { by, resulting, remaining_lost, .. } => {
                writeln!(f, "\t⏺ Conviene aumentar la dotación en: {}", by)?;
                writeln!(f, "\t   ➥ La dotación quedaría en: {}", resulting)?;
                write!(f, "\t   ➥ Solicitudes sin atender ≈ {}", remaining_lost)
            }
            StaffingAdvice::Efficient => {
                write!(f, "\t⏺ ¡La estación trabaja eficientemente! Ocupación: ALTA")
            }
            StaffingAdvice::NoChange { service_minutes } => {
                writeln!(f, "\t⏺ No hace falta cambiar la dotación.")?;
                write!(f, "\t   ➥ Tiempo de servicio: {} min.", service_minutes)
            }
            StaffingAdvice::Decrease { by, resulting, service_minutes } => {
                writeln!(f, "\t⏺ Conviene reducir la dotación en: {}", by)?;
                writeln!(f, "\t   ➥ La dotación quedaría en: {}", resulting)?;
                write!(f, "\t   ➥ Tiempo de servicio: {} min.", service_minutes)
            }
        }
    }
}

/// Estadística final de una estación, válida solo cuando su trabajador
/// terminó (`WorkerPhase::Done`). Tiempos en las unidades indicadas.
#[derive(Clone, Debug, PartialEq)]
pub struct StationReport {
    pub category: ServiceCategory,
    pub staffing: u32,
    pub submitted: u64,
    pub completed: u64,
    /// Proyección de solicitudes que no llegarían a atenderse; es un
    /// estimador, no un conteo exacto de lo descartado
    pub lost: u64,
    /// Largo promedio de cola: `submitted / completed`
    pub avg_queue_len: f64,
    /// Tiempo nominal de servicio por solicitud, en minutos
    pub base_service_minutes: u64,
    /// Tiempo promedio real de servicio, en minutos
    pub avg_service_minutes: u64,
    /// Tiempo de carga útil dentro de la ventana, en minutos
    pub busy_minutes: u64,
    /// Tiempo ocioso dentro de la ventana, en minutos
    pub idle_minutes: u64,
    pub employment: EmploymentRate,
    /// Ingreso acumulado de la estación
    pub revenue: i64,
    /// Salario por mecánico
    pub salary: i64,
    /// Ganancia neta: ingreso − salario × dotación
    pub profit: i64,
    /// Ingreso perdido proyectado: perdidas × tarifa
    pub lost_profit: i64,
    pub advice: StaffingAdvice,
}

/// Totales del taller completo, sumados desde el informe final de cada
/// estación. Cada estación aporta exactamente una vez, bajo exclusión
/// mutua, porque varias pueden terminar casi a la vez.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateTotals {
    pub mechanics: u64,
    pub requests: u64,
    pub completed: u64,
    pub lost: u64,
    pub profit: i64,
    pub lost_profit: i64,
}

impl AggregateTotals {
    /// Suma el informe final de una estación a los totales.
    pub fn absorb(&mut self, report: &StationReport) {
        self.mechanics += u64::from(report.staffing);
        self.requests += report.submitted;
        self.completed += report.completed;
        self.lost += report.lost;
        self.profit += report.profit;
        self.lost_profit += report.lost_profit;
    }
}

/// Estima las solicitudes que quedarían sin atender dada la tasa actual.
///
/// Decrementa una copia de `submitted` mientras
/// `(copia − completed) × service_minutes > window_minutes`, contando una
/// pérdida por iteración. Converge porque el lado izquierdo decrece
/// estrictamente; termina en a lo sumo `submitted − completed` pasos y
/// nunca es negativo.
///
/// # Examples
///
/// ```rust
/// use car_service_simulator::metrics::estimate_lost;
///
/// // Todo atendido dentro de la ventana: sin pérdidas
/// assert_eq!(estimate_lost(10, 10, 50, 4_560), 0);
/// // Atraso grande: se proyectan pérdidas
/// assert!(estimate_lost(1_000, 10, 50, 4_560) > 0);
/// ```
pub fn estimate_lost(
    submitted: u64,
    completed: u64,
    service_minutes: u64,
    window_minutes: u64,
) -> u64 {
    let mut working = submitted as i64;
    let completed = completed as i64;
    let mut lost: u64 = 0;
    while (working - completed) * service_minutes as i64 > window_minutes as i64 {
        working -= 1;
        lost += 1;
    }
    lost
}

/// Salario por mecánico: el 35% del ingreso repartido entre la dotación,
/// con un piso configurado. La aritmética entera sigue el orden
/// `(ingreso / 100) × 35 / dotación`.
pub fn payroll(revenue: i64, staffing: u32, floor: i64) -> i64 {
    let share = revenue / 100 * 35 / i64::from(staffing.max(1));
    if share > floor {
        share
    } else {
        floor
    }
}
