//! Graduate record types.

use serde::{Deserialize, Serialize};

/// Careers offered by the institution, in display order.
///
/// Informational only: `carrera` is free text in storage.
pub const CAREER_OPTIONS: [&str; 3] = [
    "Ingeniería en Sistemas Computacionales",
    "Ingeniería en Innovación Agrícola Sustentable",
    "Licenciatura en Contaduría",
];

/// Values accepted by the `estatus` check constraint.
pub const ESTATUS_VALUES: [&str; 3] = ["Egresado", "En seguimiento", "Titulado"];

/// A graduate record, one row of the `egresados` table.
///
/// No field is validated here. The 8-digit `matricula` format and the
/// `estatus` enumeration are enforced by the table's `CHECK` constraints, so
/// callers must be ready for the engine to reject a write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Graduate {
    /// Enrollment number, the primary key. Never rewritten after insert.
    pub matricula: String,
    /// Full name.
    pub nombre_completo: String,
    /// Career / program.
    pub carrera: Option<String>,
    /// Cohort label.
    pub generacion: Option<String>,
    /// Follow-up status.
    pub estatus: Option<String>,
    /// Postal address.
    pub domicilio: Option<String>,
    /// Gender.
    pub genero: Option<String>,
    /// Phone number.
    pub telefono: Option<String>,
    /// E-mail address.
    pub correo_electronico: Option<String>,
}

/// Every field of a [`Graduate`] except the key; the payload of an update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraduateFields {
    /// Full name.
    pub nombre_completo: String,
    /// Career / program.
    pub carrera: Option<String>,
    /// Cohort label.
    pub generacion: Option<String>,
    /// Follow-up status.
    pub estatus: Option<String>,
    /// Postal address.
    pub domicilio: Option<String>,
    /// Gender.
    pub genero: Option<String>,
    /// Phone number.
    pub telefono: Option<String>,
    /// E-mail address.
    pub correo_electronico: Option<String>,
}

impl Graduate {
    /// Creates a record with the two required fields; the rest are absent.
    #[must_use]
    pub fn new(matricula: impl Into<String>, nombre_completo: impl Into<String>) -> Self {
        Self {
            matricula: matricula.into(),
            nombre_completo: nombre_completo.into(),
            ..Self::default()
        }
    }

    /// Builds a record from a key and its non-key fields.
    #[must_use]
    pub fn from_parts(matricula: impl Into<String>, fields: GraduateFields) -> Self {
        Self {
            matricula: matricula.into(),
            nombre_completo: fields.nombre_completo,
            carrera: fields.carrera,
            generacion: fields.generacion,
            estatus: fields.estatus,
            domicilio: fields.domicilio,
            genero: fields.genero,
            telefono: fields.telefono,
            correo_electronico: fields.correo_electronico,
        }
    }

    /// Returns a copy of the non-key fields.
    #[must_use]
    pub fn fields(&self) -> GraduateFields {
        GraduateFields {
            nombre_completo: self.nombre_completo.clone(),
            carrera: self.carrera.clone(),
            generacion: self.generacion.clone(),
            estatus: self.estatus.clone(),
            domicilio: self.domicilio.clone(),
            genero: self.genero.clone(),
            telefono: self.telefono.clone(),
            correo_electronico: self.correo_electronico.clone(),
        }
    }

    /// Sets the career.
    #[must_use]
    pub fn with_carrera(mut self, carrera: impl Into<String>) -> Self {
        self.carrera = Some(carrera.into());
        self
    }

    /// Sets the cohort label.
    #[must_use]
    pub fn with_generacion(mut self, generacion: impl Into<String>) -> Self {
        self.generacion = Some(generacion.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_estatus(mut self, estatus: impl Into<String>) -> Self {
        self.estatus = Some(estatus.into());
        self
    }

    /// Sets the e-mail address.
    #[must_use]
    pub fn with_correo(mut self, correo: impl Into<String>) -> Self {
        self.correo_electronico = Some(correo.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_leaves_optional_fields_absent() {
        let g = Graduate::new("20231234", "Ana Pérez");
        assert_eq!(g.matricula, "20231234");
        assert_eq!(g.nombre_completo, "Ana Pérez");
        assert!(g.carrera.is_none());
        assert!(g.estatus.is_none());
        assert!(g.correo_electronico.is_none());
    }

    #[test]
    fn test_fields_and_from_parts_agree() {
        let g = Graduate::new("20231234", "Ana Pérez")
            .with_carrera(CAREER_OPTIONS[2])
            .with_estatus("Titulado")
            .with_correo("ana@example.com");

        let rebuilt = Graduate::from_parts(g.matricula.clone(), g.fields());
        assert_eq!(rebuilt, g);
    }

    #[test]
    fn test_serializes_with_column_names() {
        let g = Graduate::new("20231234", "Ana Pérez").with_generacion("2019-2023");
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["matricula"], "20231234");
        assert_eq!(json["generacion"], "2019-2023");
        assert!(json["telefono"].is_null());
    }
}
