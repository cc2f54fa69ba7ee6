// Placeholder domain: a fixed line with no statistical input. It never takes
// part in the star pick.
pub fn fouls_block() -> String {
    "🔹 Faltas: Más de 22.5 faltas totales\n   💬 Línea provisional (sin análisis detallado de faltas por ahora)."
        .to_string()
}
