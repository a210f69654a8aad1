const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Hash FNV-1a de 32 bits de la clave, recortado a 31 bits.
///
/// Tiene que dar lo mismo en cualquier proceso y en cualquier ejecución:
/// dos workers que re-ejecutan la misma tarea Map deben particionar igual.
/// Por eso no se usa `DefaultHasher`.
pub fn ihash(key: &str) -> u32 {
    let h = key
        .bytes()
        .fold(FNV32_OFFSET_BASIS, |h, b| (h ^ u32::from(b)).wrapping_mul(FNV32_PRIME));
    h & 0x7fff_ffff
}

/// Partición de reduce para una clave: `ihash(key) % n_reduce`.
pub fn partition(key: &str, n_reduce: u32) -> u32 {
    ihash(key) % n_reduce.max(1)
}
