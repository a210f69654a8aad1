use anyhow::{bail, Context, Result};
use common::{output_line, partition, KeyValue, Task, TaskPhase};
use std::io::Write;
use tracing::debug;

use crate::storage::LocalStorage;

pub type MapFn = fn(&str, &str) -> Vec<KeyValue>;
pub type ReduceFn = fn(&str, &[String]) -> String;

/// Par de funciones map/reduce que ejecuta el worker.
#[derive(Debug, Clone, Copy)]
pub struct Application {
    pub name: &'static str,
    pub map: MapFn,
    pub reduce: ReduceFn,
}

impl Application {
    pub fn wordcount() -> Self {
        Self {
            name: "wordcount",
            map: common::wordcount::map,
            reduce: common::wordcount::reduce,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "wordcount" => Some(Self::wordcount()),
            _ => None,
        }
    }
}

/// Ejecuta una tarea Map o Reduce y devuelve la copia para reportar.
/// Bloqueante (I/O de archivos): llamar desde `spawn_blocking`.
pub fn execute_task(storage: &LocalStorage, app: &Application, task: &Task) -> Result<Task> {
    match task.phase {
        TaskPhase::Map => execute_map(storage, app, task),
        TaskPhase::Reduce => execute_reduce(storage, app, task),
        other => bail!("la fase {:?} no es una tarea ejecutable", other),
    }
}

/// Map:
///   1. lee el archivo de entrada completo
///   2. aplica `map`
///   3. reparte los pares en `n_reduce` buckets por hash(key)
///   4. escribe cada bucket (JSONL) en un scratch y lo publica como
///      `intermediate-<m>-<r>`, incluso si quedó vacío
pub fn execute_map(storage: &LocalStorage, app: &Application, task: &Task) -> Result<Task> {
    let input = task
        .input
        .as_deref()
        .context("tarea map sin archivo de entrada")?;
    let content = storage
        .read_all(input)
        .with_context(|| format!("no se pudo leer la entrada {}", input))?;
    let content = String::from_utf8_lossy(&content);

    let n_reduce = task.n_reduce.max(1);
    let mut buckets: Vec<Vec<KeyValue>> = vec![Vec::new(); n_reduce as usize];
    for kv in (app.map)(input, &content) {
        let r = partition(&kv.key, n_reduce) as usize;
        buckets[r].push(kv);
    }

    // Primero se escriben todos los scratch; recién después se publica.
    let mut scratches = Vec::with_capacity(buckets.len());
    for bucket in &buckets {
        let mut scratch = storage
            .create_scratch()
            .context("no se pudo crear archivo temporal")?;
        for kv in bucket {
            serde_json::to_writer(&mut scratch, kv)?;
            scratch.write_all(b"\n")?;
        }
        scratches.push(scratch);
    }

    let mut done = task.clone();
    done.intermediates = Vec::with_capacity(scratches.len());
    for (r, scratch) in scratches.into_iter().enumerate() {
        let dest = storage.intermediate_path(task.task_number, r as u32);
        storage
            .publish(scratch, &dest)
            .with_context(|| format!("no se pudo publicar {}", dest.display()))?;
        done.intermediates.push(dest.to_string_lossy().to_string());
    }

    debug!(
        "map {} ({}) publicó {} intermedios",
        task.task_number,
        input,
        done.intermediates.len()
    );
    Ok(done)
}

/// Lee los pares de todos los archivos intermedios (una línea JSON por par).
pub fn read_intermediates(storage: &LocalStorage, locations: &[String]) -> Result<Vec<KeyValue>> {
    let mut out = Vec::new();
    for location in locations {
        let bytes = storage
            .read_all(location)
            .with_context(|| format!("no se pudo leer el intermedio {}", location))?;
        let text = String::from_utf8_lossy(&bytes);
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let kv: KeyValue = serde_json::from_str(line)
                .with_context(|| format!("línea inválida en {}", location))?;
            out.push(kv);
        }
    }
    Ok(out)
}

/// Agrupa pares ya ordenados por clave: una sola pasada sobre tramos iguales.
pub fn group_sorted(sorted: &[KeyValue]) -> Vec<(&str, Vec<String>)> {
    let mut groups: Vec<(&str, Vec<String>)> = Vec::new();
    for kv in sorted {
        if let Some((key, values)) = groups.last_mut() {
            if *key == kv.key {
                values.push(kv.value.clone());
                continue;
            }
        }
        groups.push((kv.key.as_str(), vec![kv.value.clone()]));
    }
    groups
}

/// Reduce:
///   1. lee todos los intermedios de la partición
///   2. ordena por clave (sort estable)
///   3. llama `reduce` una vez por clave distinta
///   4. escribe líneas "<key> <valor>" y publica `output-<r>`
pub fn execute_reduce(storage: &LocalStorage, app: &Application, task: &Task) -> Result<Task> {
    let mut kvs = read_intermediates(storage, &task.intermediates)?;
    kvs.sort_by(|a, b| a.key.cmp(&b.key));

    let mut scratch = storage
        .create_scratch()
        .context("no se pudo crear archivo temporal")?;
    let groups = group_sorted(&kvs);
    for (key, values) in &groups {
        let output = (app.reduce)(key, values);
        writeln!(scratch, "{}", output_line(key, &output))?;
    }

    let dest = storage.output_path(task.task_number);
    storage
        .publish(scratch, &dest)
        .with_context(|| format!("no se pudo publicar {}", dest.display()))?;

    debug!(
        "reduce {} escribió {} claves en {}",
        task.task_number,
        groups.len(),
        dest.display()
    );
    Ok(task.clone())
}
