//! Display-language table.
//!
//! Aggregation works on numeric month/weekday keys only; names and labels are
//! looked up here when something is rendered.

use chrono::Weekday;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::Notice;
use crate::io::ingest::SchemaError;

const MONTHS_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Indexed from Sunday.
const DAYS_ES: [&str; 7] = ["Domingo", "Lunes", "Martes", "Miércoles", "Jueves", "Viernes", "Sábado"];
const DAYS_EN: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Es,
    En,
}

/// Fixed UI strings for one locale.
#[derive(Debug, Clone, Copy)]
pub struct Labels {
    pub preview: &'static str,
    pub summary: &'static str,
    pub mean: &'static str,
    pub max: &'static str,
    pub min: &'static str,
    pub std_dev: &'static str,
    pub duplicates: &'static str,
    pub no_duplicates: &'static str,
    pub daily: &'static str,
    pub monthly: &'static str,
    pub weekday: &'static str,
    pub trend: &'static str,
    pub date: &'static str,
    pub amount: &'static str,
    pub success: &'static str,
}

const LABELS_ES: Labels = Labels {
    preview: "Vista Previa de los Datos",
    summary: "Resumen Estadístico",
    mean: "Promedio",
    max: "Máximo",
    min: "Mínimo",
    std_dev: "Desviación",
    duplicates: "Facturas Duplicadas",
    no_duplicates: "No se detectaron facturas duplicadas.",
    daily: "Ventas por Día",
    monthly: "Ventas por Mes",
    weekday: "Distribución de Ventas por Día de la Semana",
    trend: "Regresión Lineal de Ventas",
    date: "Fecha",
    amount: "Importe Total",
    success: "¡Archivo procesado con éxito!",
};

const LABELS_EN: Labels = Labels {
    preview: "Data preview",
    summary: "Summary statistics",
    mean: "Mean",
    max: "Max",
    min: "Min",
    std_dev: "Std dev",
    duplicates: "Duplicate invoices",
    no_duplicates: "No duplicate invoices detected.",
    daily: "Sales by day",
    monthly: "Sales by month",
    weekday: "Sales by weekday",
    trend: "Sales linear trend",
    date: "Date",
    amount: "Total amount",
    success: "File processed successfully!",
};

impl Locale {
    pub fn next(self) -> Self {
        match self {
            Locale::Es => Locale::En,
            Locale::En => Locale::Es,
        }
    }

    /// Month name for `month` in `1..=12` (out-of-range input is clamped).
    pub fn month_name(self, month: u32) -> &'static str {
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::Es => MONTHS_ES[idx],
            Locale::En => MONTHS_EN[idx],
        }
    }

    pub fn weekday_name(self, day: Weekday) -> &'static str {
        let idx = day.num_days_from_sunday() as usize;
        match self {
            Locale::Es => DAYS_ES[idx],
            Locale::En => DAYS_EN[idx],
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Locale::Es => &LABELS_ES,
            Locale::En => &LABELS_EN,
        }
    }

    pub fn notice(self, notice: &Notice) -> String {
        match (self, notice) {
            (Locale::En, n) => n.to_string(),
            (Locale::Es, Notice::NoValidData) => {
                "No hay valores numéricos válidos en la columna de importe para graficar.".to_string()
            }
            (Locale::Es, Notice::NoDatedData) => {
                "No hay datos de fecha o ventas válidos para mostrar.".to_string()
            }
            (Locale::Es, Notice::InsufficientData { points }) => format!(
                "Se requieren al menos dos puntos de datos para la regresión (hay {points})."
            ),
        }
    }

    pub fn schema_error(self, err: &SchemaError) -> String {
        match (self, err) {
            (Locale::En, e) => e.to_string(),
            (Locale::Es, SchemaError::EmptyTable) => "El archivo no contiene datos.".to_string(),
            (Locale::Es, SchemaError::MissingColumns(cols)) => {
                format!("Faltan las siguientes columnas obligatorias: {}", cols.join(", "))
            }
        }
    }

    pub fn duplicate_count(self, n: usize) -> String {
        match self {
            Locale::Es => format!("Se detectaron {n} facturas duplicadas."),
            Locale::En => format!("Detected {n} duplicate invoice rows."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_and_weekday_names() {
        assert_eq!(Locale::Es.month_name(1), "Enero");
        assert_eq!(Locale::En.month_name(12), "December");
        assert_eq!(Locale::Es.weekday_name(Weekday::Sun), "Domingo");
        assert_eq!(Locale::Es.weekday_name(Weekday::Wed), "Miércoles");
        assert_eq!(Locale::En.weekday_name(Weekday::Sat), "Saturday");
    }

    #[test]
    fn notices_are_localized() {
        let es = Locale::Es.notice(&Notice::InsufficientData { points: 1 });
        assert!(es.contains("al menos dos"));
        let en = Locale::En.notice(&Notice::InsufficientData { points: 1 });
        assert!(en.starts_with("insufficient data"));
    }

    #[test]
    fn schema_errors_are_localized() {
        let missing = SchemaError::MissingColumns(vec!["FECHA".to_string(), "IMPORTE".to_string()]);
        assert_eq!(
            Locale::Es.schema_error(&missing),
            "Faltan las siguientes columnas obligatorias: FECHA, IMPORTE"
        );
        assert_eq!(Locale::En.schema_error(&missing), "Missing required columns: FECHA, IMPORTE");
        assert_eq!(Locale::Es.schema_error(&SchemaError::EmptyTable), "El archivo no contiene datos.");
        assert_eq!(Locale::En.schema_error(&SchemaError::EmptyTable), "The file contains no data rows.");
    }
}
