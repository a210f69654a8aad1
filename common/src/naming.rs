use crate::task::TaskNumber;

/// Nombre final del archivo intermedio que la tarea Map `map_task`
/// produce para la partición `reduce_partition`.
pub fn intermediate_name(map_task: TaskNumber, reduce_partition: u32) -> String {
    format!("intermediate-{}-{}", map_task, reduce_partition)
}

/// Nombre final del archivo de salida de la tarea Reduce `reduce_task`.
pub fn output_name(reduce_task: TaskNumber) -> String {
    format!("output-{}", reduce_task)
}

/// Línea de salida de reduce: `<key> <value>`.
pub fn output_line(key: &str, value: &str) -> String {
    format!("{} {}", key, value)
}
