//! # Módulo del Despachador
//!
//! El despachador es el coordinador del taller: posee el conjunto fijo de
//! estaciones (una por categoría), la señal de marcha compartida y los
//! totales agregados. Se construye una sola vez al inicio del proceso y se
//! pasa por referencia a los colaboradores, en lugar de vivir como estado
//! global perezoso, para mantener explícitos su ciclo de vida y su prueba.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::metrics::AggregateTotals;
use crate::request::{Client, Request, ServiceCategory};
use crate::station::{SimParams, Station, StationConfig};

/// Error de enrutamiento: la solicitud no corresponde a ninguna estación
/// configurada. Es un error de programación del llamador, no una condición
/// recuperable en tiempo de ejecución; se reporta explícito para fallar
/// rápido en vez de descartar en silencio.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoutingError {
    #[error("ninguna estación atiende la categoría «{0}»")]
    UnknownCategory(ServiceCategory),
}

/// Coordinador del taller completo.
///
/// Posee en exclusiva el conjunto de estaciones y la señal de marcha; cada
/// estación posee en exclusiva su cola y sus contadores. Los totales
/// agregados son el único recurso que mutan varios hilos al terminar, bajo
/// exclusión mutua.
pub struct Dispatcher {
    stations: Vec<Arc<Station>>,
    signal: Arc<AtomicBool>,
    totals: Arc<Mutex<AggregateTotals>>,
    clients: Mutex<Vec<Client>>,
    started: Instant,
    launched: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Construye el taller con una estación por configuración recibida.
    ///
    /// # Arguments
    ///
    /// * `params` - Parámetros globales compartidos por las estaciones
    /// * `configs` - Una configuración por estación; las categorías deben
    ///   ser distintas entre sí para que el enrutamiento sea unívoco
    /// * `seed` - Semilla base; cada estación deriva la suya
    pub fn new(params: SimParams, configs: Vec<StationConfig>, seed: u64) -> Self {
        let stations = configs
            .into_iter()
            .enumerate()
            .map(|(i, config)| {
                Arc::new(Station::new(
                    config,
                    params.clone(),
                    seed.wrapping_add(i as u64 * 1_000),
                ))
            })
            .collect();

        Self {
            stations,
            signal: Arc::new(AtomicBool::new(true)),
            totals: Arc::new(Mutex::new(AggregateTotals::default())),
            clients: Mutex::new(Vec::new()),
            started: Instant::now(),
            launched: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Lanza un hilo trabajador por estación. Cada uno recibe la señal de
    /// marcha y el agregado compartidos y corre hasta su propio cierre.
    ///
    /// Solo el primer llamado lanza hilos; los siguientes no hacen nada,
    /// para que ninguna estación quede atendida por dos trabajadores ni
    /// aporte dos veces al agregado.
    pub fn start(&self) {
        if self.launched.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut workers = self
            .workers
            .lock()
            .expect("no se pudo tomar el lock de los trabajadores");
        for station in &self.stations {
            let station = Arc::clone(station);
            let signal = Arc::clone(&self.signal);
            let totals = Arc::clone(&self.totals);
            let handle = thread::Builder::new()
                .name(format!("estacion-{}", station.category()))
                .spawn(move || station.run(&signal, &totals))
                .expect("no se pudo lanzar el hilo de la estación");
            workers.push(handle);
        }
    }

    /// Enruta una solicitud a la única estación de su categoría.
    ///
    /// # Returns
    ///
    /// `Err(RoutingError::UnknownCategory)` si ninguna estación configurada
    /// atiende la categoría de la solicitud.
    pub fn route(&self, request: Request) -> Result<(), RoutingError> {
        let category = request.category;
        match self
            .stations
            .iter()
            .find(|station| station.category() == category)
        {
            Some(station) => {
                self.clients
                    .lock()
                    .expect("no se pudo tomar el lock del registro de clientes")
                    .push(request.client.clone());
                station.submit(request);
                Ok(())
            }
            None => Err(RoutingError::UnknownCategory(category)),
        }
    }

    /// Registro de clientes enrutados, en orden de llegada. Las solicitudes
    /// rechazadas por categoría desconocida no se registran.
    pub fn clients(&self) -> Vec<Client> {
        self.clients
            .lock()
            .expect("no se pudo tomar el lock del registro de clientes")
            .clone()
    }

    /// Apaga la señal de marcha. Detiene la generación de solicitudes;
    /// cada estación completa igual su propio cierre por ventana.
    pub fn stop(&self) {
        self.signal.store(false, Ordering::Release);
    }

    /// Estado de la señal de marcha compartida.
    pub fn is_running(&self) -> bool {
        self.signal.load(Ordering::Acquire)
    }

    /// Espera a que todos los trabajadores terminen su cierre.
    pub fn join(&self) {
        let handles: Vec<_> = self
            .workers
            .lock()
            .expect("no se pudo tomar el lock de los trabajadores")
            .drain(..)
            .collect();
        for handle in handles {
            handle.join().expect("un trabajador de estación falló");
        }
    }

    /// Copia de los totales agregados. Completa recién cuando todas las
    /// estaciones publicaron su informe final.
    pub fn totals(&self) -> AggregateTotals {
        self.totals
            .lock()
            .expect("no se pudo tomar el lock de los totales")
            .clone()
    }

    /// Estaciones del taller, para consulta de instantáneas e informes.
    pub fn stations(&self) -> &[Arc<Station>] {
        &self.stations
    }

    /// Tiempo real transcurrido desde la construcción del despachador.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
