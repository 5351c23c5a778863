//! # Módulo Generador de Solicitudes
//!
//! Colaborador externo al motor: produce ráfagas de solicitudes sobre un
//! calendario semanal ponderado por hora del día y las entrega al
//! despachador. Al agotar su calendario apaga la señal de marcha; las
//! estaciones completan igual su propio cierre por ventana.

use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::dispatcher::{Dispatcher, RoutingError};
use crate::request::{Client, Request, ServiceCategory};

/// Minutos simulados de un día hábil.
const WEEKDAY_MINUTES: u64 = 720;
/// Minutos simulados de un día de fin de semana.
const OFFDAY_MINUTES: u64 = 480;

/// Generador de llegadas con horario semanal.
///
/// Los días hábiles duran 720 minutos y los de fin de semana 480; en la
/// franja central del día las ráfagas llegan con el doble de frecuencia.
/// Cada ráfaga pertenece a un mismo cliente y trae de 1 a 4 categorías
/// distintas barajadas (85% una, 10% dos, 5% tres, 1% cuatro).
pub struct RequestGenerator {
    rng: StdRng,
    tick: Duration,
    days: u32,
    verbose: bool,
}

impl RequestGenerator {
    /// Crea un generador reproducible.
    ///
    /// # Arguments
    ///
    /// * `tick` - Duración real de un tick (0.1 minuto simulado)
    /// * `days` - Días de calendario a generar; 7 reproduce la semana
    /// * `seed` - Semilla de la fuente aleatoria
    pub fn new(tick: Duration, days: u32, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            tick,
            days,
            verbose: true,
        }
    }

    /// Silencia las líneas de progreso del generador.
    pub fn quiet(mut self) -> Self {
        self.verbose = false;
        self
    }

    /// Recorre el calendario completo entregando ráfagas al despachador y
    /// apaga la señal de marcha al terminar.
    ///
    /// # Returns
    ///
    /// El primer error de enrutamiento, si una categoría generada no tiene
    /// estación; la generación se interrumpe en ese punto.
    pub fn run(&mut self, dispatcher: &Dispatcher) -> Result<(), RoutingError> {
        if self.verbose {
            println!("[GENERADOR] iniciando calendario de {} día(s)", self.days);
        }

        for day in 1..=self.days {
            let weekday = (day - 1) % 7 < 5;
            let (span, peak_from, peak_to) = if weekday {
                (WEEKDAY_MINUTES, 270, 450)
            } else {
                (OFFDAY_MINUTES, 180, 300)
            };

            let mut minute: u64 = 0;
            while minute <= span {
                // En la franja central las ráfagas llegan más seguido
                let step: u64 = if minute <= peak_from || minute >= peak_to {
                    self.rng.random_range(30..=60)
                } else {
                    self.rng.random_range(15..=30)
                };

                self.emit_burst(dispatcher)?;
                thread::sleep(self.tick * (step * 10) as u32);
                minute += step;
            }

            if self.verbose {
                println!("[GENERADOR] día {} terminado", day);
            }
        }

        dispatcher.stop();
        if self.verbose {
            println!("[GENERADOR] calendario agotado, señal de marcha apagada");
        }
        Ok(())
    }

    /// Entrega una ráfaga de un mismo cliente: categorías distintas
    /// barajadas, con el tamaño sorteado sobre la distribución 85/10/5/1.
    fn emit_burst(&mut self, dispatcher: &Dispatcher) -> Result<(), RoutingError> {
        let client = Client::random(&mut self.rng);

        let mut deck = ServiceCategory::ALL;
        deck.shuffle(&mut self.rng);

        let roll: u32 = self.rng.random_range(1..=100);
        let burst = if roll == 100 {
            4
        } else if roll >= 95 {
            3
        } else if roll >= 85 {
            2
        } else {
            1
        };

        for category in deck.into_iter().take(burst) {
            dispatcher.route(Request::new(client.clone(), category))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::{SimParams, StationConfig};

    fn full_configs() -> Vec<StationConfig> {
        ServiceCategory::ALL
            .iter()
            .map(|&category| StationConfig {
                category,
                revenue_per_request: 1_500,
                max_service_minutes: 420,
                perturbation_spread: 360,
                staffing: Some(4),
            })
            .collect()
    }

    #[test]
    fn test_bursts_route_to_all_configured_stations() {
        let params = SimParams {
            window_ticks: 600,
            tick: Duration::from_micros(10),
            salary_floor: 7_000,
            verbose: false,
        };
        let dispatcher = Dispatcher::new(params, full_configs(), 11);

        // Sin trabajadores: solo interesa el enrutamiento y los contadores
        let mut generator = RequestGenerator::new(Duration::from_micros(10), 1, 11).quiet();
        generator.run(&dispatcher).expect("todas las categorías existen");

        assert!(!dispatcher.is_running());
        let submitted: u64 = dispatcher
            .stations()
            .iter()
            .map(|s| s.snapshot().submitted)
            .sum();
        // Un día hábil de 720 min con pasos de 15..=60 produce al menos
        // una ráfaga de apertura y no más de 720/15 + 1 ráfagas de hasta 4
        assert!(submitted >= 12);
        assert!(submitted <= 4 * (720 / 15 + 1));
    }

    #[test]
    fn test_generation_stops_on_unknown_category() {
        let params = SimParams {
            window_ticks: 600,
            tick: Duration::from_micros(10),
            salary_floor: 7_000,
            verbose: false,
        };
        // Solo una estación: tarde o temprano sale una categoría sin destino
        let dispatcher = Dispatcher::new(
            params,
            vec![StationConfig {
                category: ServiceCategory::Inspection,
                revenue_per_request: 1_500,
                max_service_minutes: 420,
                perturbation_spread: 360,
                staffing: Some(4),
            }],
            11,
        );

        let mut generator = RequestGenerator::new(Duration::from_micros(10), 7, 11).quiet();
        let result = generator.run(&dispatcher);
        assert!(matches!(result, Err(RoutingError::UnknownCategory(_))));
    }
}
