use common::{intermediate_name, output_name};
use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::{Builder, NamedTempFile};

/// Archivo temporal privado del worker. Nadie lo lee hasta que se publica;
/// si se descarta sin publicar, se borra solo.
pub struct Scratch {
    writer: BufWriter<NamedTempFile>,
}

impl Scratch {
    pub fn path(&self) -> &Path {
        self.writer.get_ref().path()
    }
}

impl Write for Scratch {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Almacenamiento en disco local (o compartido) de intermedios y salidas.
///
/// Los nombres finales sólo aparecen vía `rename` dentro del mismo
/// directorio, así que un lector nunca ve un archivo a medio escribir.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    /// Ubicación final de `intermediate-<m>-<r>`.
    pub fn intermediate_path(&self, m: u32, r: u32) -> PathBuf {
        self.dir.join(intermediate_name(m, r))
    }

    /// Ubicación final de `output-<r>`.
    pub fn output_path(&self, r: u32) -> PathBuf {
        self.dir.join(output_name(r))
    }

    /// Contenido completo de una entrada o de un archivo intermedio.
    pub fn read_all(&self, location: &str) -> io::Result<Vec<u8>> {
        fs::read(location)
    }

    pub fn create_scratch(&self) -> io::Result<Scratch> {
        let file = Builder::new().prefix(".scratch-").tempfile_in(&self.dir)?;
        Ok(Scratch {
            writer: BufWriter::new(file),
        })
    }

    /// Bajada a disco + rename atómico a `dest` (pisa el anterior si existe).
    /// `dest` sale de `intermediate_path`/`output_path`: mismo directorio que
    /// el scratch. Si algo falla, el scratch se borra al soltarse.
    pub fn publish(&self, scratch: Scratch, dest: &Path) -> io::Result<()> {
        let file = scratch.writer.into_inner().map_err(|e| e.into_error())?;
        file.as_file().sync_all()?;
        file.persist(dest).map_err(|e| e.error)?;
        Ok(())
    }
}
