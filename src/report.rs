//! # Módulo de Reportes
//!
//! Colaborador de presentación: arma, a partir de las instantáneas, los
//! informes finales y los totales agregados, los bloques de texto que se
//! muestran por consola o se persisten en archivo. No tiene efectos sobre
//! el motor; consume únicamente datos de solo lectura.

use std::io;
use std::path::Path;

use crate::dispatcher::Dispatcher;
use crate::metrics::{AggregateTotals, StaffingAdvice, StationReport};
use crate::request::Client;
use crate::station::Station;

/// Línea divisoria de los reportes.
pub fn dividing_line() -> &'static str {
    "~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~"
}

/// Líneas de progreso de todas las estaciones, para el despliegue
/// periódico durante la corrida.
pub fn progress_lines(dispatcher: &Dispatcher) -> String {
    let mut out = String::new();
    out.push_str("         estación: recibidas ➠ atendidas ⚯ promedio ➠ ocupación\n");
    for station in dispatcher.stations() {
        let snapshot = station.snapshot();
        out.push_str(&format!(
            "⏺ Estación «{}»: {} ➠ {} ⚯ {} min. ➠ {}\n",
            snapshot.category,
            snapshot.submitted,
            snapshot.completed,
            snapshot.avg_service_minutes,
            snapshot.employment
        ));
    }
    out
}

/// Bloque de estadística completa de una estación.
pub fn station_block(report: &StationReport) -> String {
    format!(
        "\n<<< Estación «{}»\n\
         <<< Mecánicos: {}\n\
         \t⏺ Solicitudes recibidas: {}\n\
         \t⏺ Solicitudes atendidas: {}\n\
         \t⏺ Quedarían sin atender ≈ {}\n\
         \t⏺ Largo promedio de cola: {:.2}\n\
         \t⏺ Tiempo nominal de servicio: {} min.\n\
         \t⏺ Tiempo promedio de servicio: {} min.\n\
         \t⏺ Tiempo de carga útil: {} min.\n\
         \t⏺ Tiempo ocioso: {} min.\n\
         \t⏺ Ocupación: {}\n\
         \t⏺ Ingreso: {}₴\n\
         \t⏺ Salario por mecánico: {}₴\n\
         \t⏺ Ganancia neta: {}₴\n\
         \t⏺ Ingreso perdido ≈ {}₴\n{}\n",
        report.category,
        report.staffing,
        report.submitted,
        report.completed,
        report.lost,
        report.avg_queue_len,
        report.base_service_minutes,
        report.avg_service_minutes,
        report.busy_minutes,
        report.idle_minutes,
        report.employment,
        report.revenue,
        report.salary,
        report.profit,
        report.lost_profit,
        dividing_line()
    )
}

/// Bloque con los totales del taller.
pub fn general_block(totals: &AggregateTotals) -> String {
    format!(
        "\n\t⏺ Mecánicos en el taller: {}\n\
         \t⏺ Solicitudes recibidas en total: {}\n\
         \t⏺ Solicitudes atendidas: {}\n\
         \t⏺ Sin atender ≈ {}\n\
         \t⏺ Ganancia del taller: {}₴\n\
         \t⏺ Ingreso perdido ≈ {}₴\n",
        totals.mechanics,
        totals.requests,
        totals.completed,
        totals.lost,
        totals.profit,
        totals.lost_profit
    )
}

/// Bloque de recomendación de una estación, con el encabezado de riesgo
/// que corresponda a su resultado.
pub fn recommendation_block(report: &StationReport) -> String {
    let mut out = String::new();
    match &report.advice {
        StaffingAdvice::Increase { certain_loss, .. } => {
            if *certain_loss {
                out.push_str(&format!("<<< Estación «{}» - ¡incurre en pérdidas!\n", report.category));
            } else {
                out.push_str(&format!("<<< Estación «{}» - puede incurrir en pérdidas.\n", report.category));
            }
        }
        _ => {
            out.push_str(&format!("<<< Estación «{}» - no incurre en pérdidas.\n", report.category));
            if report.advice != StaffingAdvice::Efficient {
                out.push_str(&format!("\t⏺ Ocupación observada: {}\n", report.employment));
            }
        }
    }
    out.push_str(&format!("{}\n", report.advice));
    out
}

/// Nómina de una estación: sus mecánicos, uno por línea.
pub fn mechanic_roster_block(station: &Station) -> String {
    let mut out = format!(
        "\n<<< Estación «{}» - {} mecánico(s)\n",
        station.category(),
        station.staffing()
    );
    for mechanic in station.mechanics() {
        out.push_str(&format!("\t⏺ {}\n", mechanic));
    }
    out
}

/// Registro de clientes enrutados durante la corrida, en orden de llegada.
pub fn client_ledger_block(clients: &[Client]) -> String {
    let mut out = format!("\n\t⏺ Clientes registrados: {}\n", clients.len());
    for (i, client) in clients.iter().enumerate() {
        out.push_str(&format!("\t{:>4}. {}\n", i + 1, client));
    }
    out
}

/// Reporte completo del taller: estadística por estación, totales,
/// recomendaciones, nómina de mecánicos y registro de clientes. Requiere
/// que todas las estaciones hayan terminado.
pub fn full_report(dispatcher: &Dispatcher) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", dividing_line()));
    out.push_str("           <<< Estadística por estación >>>\n");
    out.push_str(&format!("{}\n", dividing_line()));
    for station in dispatcher.stations() {
        if let Some(report) = station.final_report() {
            out.push_str(&station_block(&report));
        }
    }

    out.push_str(&format!("\n{}\n", dividing_line()));
    out.push_str("            <<< Estadística del taller >>>\n");
    out.push_str(&format!("{}\n", dividing_line()));
    out.push_str(&general_block(&dispatcher.totals()));

    out.push_str(&format!("\n{}\n", dividing_line()));
    out.push_str("         <<< Recomendaciones para el taller >>>\n");
    out.push_str(&format!("{}\n\n", dividing_line()));
    for station in dispatcher.stations() {
        if let Some(report) = station.final_report() {
            out.push_str(&recommendation_block(&report));
            out.push('\n');
        }
    }

    out.push_str(&format!("{}\n", dividing_line()));
    out.push_str("            <<< Nómina de mecánicos >>>\n");
    out.push_str(&format!("{}\n", dividing_line()));
    for station in dispatcher.stations() {
        out.push_str(&mechanic_roster_block(station));
    }

    out.push_str(&format!("\n{}\n", dividing_line()));
    out.push_str("            <<< Registro de clientes >>>\n");
    out.push_str(&format!("{}\n", dividing_line()));
    out.push_str(&client_ledger_block(&dispatcher.clients()));

    out.push('\n');
    out.push_str(dividing_line());
    out.push('\n');

    out
}

/// Persiste un reporte ya armado.
pub fn write_report<P: AsRef<Path>>(path: P, contents: &str) -> io::Result<()> {
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::metrics::EmploymentRate;
    use crate::request::ServiceCategory;
    use crate::station::{SimParams, StationConfig};

    fn sample_report(advice: StaffingAdvice) -> StationReport {
        StationReport {
            category: ServiceCategory::BodyRepair,
            staffing: 3,
            submitted: 12,
            completed: 10,
            lost: 0,
            avg_queue_len: 1.2,
            base_service_minutes: 256,
            avg_service_minutes: 260,
            busy_minutes: 2_600,
            idle_minutes: 1_960,
            employment: EmploymentRate::Middle,
            revenue: 45_000,
            salary: 7_000,
            profit: 45_000 - 7_000 * 3,
            lost_profit: 0,
            advice,
        }
    }

    #[test]
    fn test_station_block_contains_key_figures() {
        let block = station_block(&sample_report(StaffingAdvice::NoChange {
            service_minutes: 256,
        }));
        assert!(block.contains("Estación «Carrocería»"));
        assert!(block.contains("Mecánicos: 3"));
        assert!(block.contains("Solicitudes recibidas: 12"));
        assert!(block.contains("Largo promedio de cola: 1.20"));
        assert!(block.contains("Ocupación: MEDIA"));
    }

    #[test]
    fn test_recommendation_headers_track_loss_risk() {
        let certain = sample_report(StaffingAdvice::Increase {
            by: 2,
            resulting: 5,
            remaining_lost: 0,
            certain_loss: true,
        });
        assert!(recommendation_block(&certain).contains("¡incurre en pérdidas!"));

        let possible = sample_report(StaffingAdvice::Increase {
            by: 2,
            resulting: 5,
            remaining_lost: 3,
            certain_loss: false,
        });
        assert!(recommendation_block(&possible).contains("puede incurrir en pérdidas"));

        let healthy = sample_report(StaffingAdvice::Efficient);
        assert!(recommendation_block(&healthy).contains("no incurre en pérdidas"));
    }

    #[test]
    fn test_mechanic_roster_lists_one_line_per_post() {
        let station = Station::new(
            StationConfig {
                category: ServiceCategory::Inspection,
                revenue_per_request: 1_500,
                max_service_minutes: 420,
                perturbation_spread: 360,
                staffing: Some(3),
            },
            SimParams {
                window_ticks: 600,
                tick: Duration::from_micros(50),
                salary_floor: 7_000,
                verbose: false,
            },
            19,
        );
        let block = mechanic_roster_block(&station);
        assert!(block.contains("Estación «Revisión técnica» - 3 mecánico(s)"));
        assert_eq!(block.matches('⏺').count(), 3);
    }

    #[test]
    fn test_client_ledger_numbers_arrivals_in_order() {
        let clients = vec![
            Client { name: "Carlos", surname: "Mora" },
            Client { name: "Lucía", surname: "Vargas" },
        ];
        let block = client_ledger_block(&clients);
        assert!(block.contains("Clientes registrados: 2"));
        assert!(block.contains("1. Mora Carlos"));
        assert!(block.contains("2. Vargas Lucía"));
        // El primero de la corrida encabeza el registro
        assert!(block.find("Mora Carlos") < block.find("Vargas Lucía"));
    }

    #[test]
    fn test_general_block_echoes_totals() {
        let totals = AggregateTotals {
            mechanics: 18,
            requests: 120,
            completed: 95,
            lost: 20,
            profit: 150_000,
            lost_profit: 60_000,
        };
        let block = general_block(&totals);
        assert!(block.contains("Mecánicos en el taller: 18"));
        assert!(block.contains("atendidas: 95"));
        assert!(block.contains("Ganancia del taller: 150000₴"));
    }
}
