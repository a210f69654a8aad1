use anyhow::Result;
use async_trait::async_trait;
use common::{wordcount, Task, TaskPhase};
use master::{build_router, Coordinator};
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::net::TcpListener;
use worker::{
    execute_task, run_worker, Application, CoordinatorRpc, HttpCoordinatorClient, LocalStorage,
    RetryPolicy,
};

fn temp_dir(sub: &str) -> PathBuf {
    let base = env::temp_dir().join("worker_end_to_end").join(sub);
    let _ = fs::remove_dir_all(&base);
    fs::create_dir_all(&base).unwrap();
    base
}

/// El worker hablando con el master dentro del mismo proceso.
struct InProcess {
    coordinator: Coordinator,
    worker_id: String,
}

#[async_trait]
impl CoordinatorRpc for InProcess {
    async fn assign_task(&self) -> Result<Task> {
        Ok(self.coordinator.assign_task(&self.worker_id))
    }

    async fn report_completion(&self, task: &Task) -> Result<bool> {
        Ok(self.coordinator.report_completion(task))
    }
}

const TEXTS: [&str; 3] = [
    "el perro y el gato",
    "El gato duerme, el perro no.",
    "gato gato gato",
];

fn write_inputs(dir: &Path) -> Vec<String> {
    let input_dir = dir.join("input");
    fs::create_dir_all(&input_dir).unwrap();
    TEXTS
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let path = input_dir.join(format!("pg-{}.txt", i));
            fs::write(&path, text).unwrap();
            path.to_string_lossy().to_string()
        })
        .collect()
}

fn expected_counts() -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for (i, text) in TEXTS.iter().enumerate() {
        for kv in wordcount::map(&format!("pg-{}.txt", i), text) {
            *counts.entry(kv.key).or_insert(0) += 1;
        }
    }
    counts
}

/// Junta todas las salidas `output-<r>`; cada clave debe aparecer una sola vez.
fn collect_outputs(storage: &LocalStorage, n_reduce: u32) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for r in 0..n_reduce {
        let content = fs::read_to_string(storage.output_path(r)).unwrap();
        let keys: Vec<&str> = content.lines().map(|l| l.split(' ').next().unwrap()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "output-{} no está ordenado por clave", r);

        for line in content.lines() {
            let (key, value) = line.split_once(' ').unwrap();
            let prev = counts.insert(key.to_string(), value.parse::<u64>().unwrap());
            assert!(prev.is_none(), "clave {} repetida entre particiones", key);
        }
    }
    counts
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_workers_finish_wordcount() {
    let tmp = temp_dir("concurrent");
    let inputs = write_inputs(&tmp);
    let n_reduce = 3;
    let coordinator = Coordinator::new(inputs, n_reduce);
    let storage = Arc::new(LocalStorage::new(tmp.join("work")).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|w| {
            let rpc = InProcess {
                coordinator: coordinator.clone(),
                worker_id: format!("w{}", w),
            };
            let storage = storage.clone();
            tokio::spawn(async move {
                run_worker(&rpc, storage, Application::wordcount(), Duration::from_millis(5)).await
            })
        })
        .collect();

    let mut maps = 0;
    let mut reduces = 0;
    for h in handles {
        let summary = h.await.unwrap().unwrap();
        maps += summary.maps;
        reduces += summary.reduces;
    }

    assert!(coordinator.is_done());
    assert_eq!(maps, 3);
    assert_eq!(reduces, n_reduce);
    assert_eq!(collect_outputs(&storage, n_reduce), expected_counts());
}

#[tokio::test]
async fn straggler_is_replaced_and_its_late_report_discarded() {
    let tmp = temp_dir("straggler");
    let inputs = write_inputs(&tmp);
    let n_reduce = 2;
    let coordinator = Coordinator::new(inputs, n_reduce);
    let storage = LocalStorage::new(tmp.join("work")).unwrap();

    // un worker toma la primera tarea map y se cuelga
    let stuck = coordinator.assign_task("colgado");
    assert_eq!(stuck.phase, TaskPhase::Map);

    // vence el timeout y la tarea vuelve a la cola
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(coordinator.scan_timeouts(Duration::ZERO), 1);

    let rpc = InProcess {
        coordinator: coordinator.clone(),
        worker_id: "sano".to_string(),
    };
    let summary = run_worker(
        &rpc,
        Arc::new(storage.clone()),
        Application::wordcount(),
        Duration::from_millis(1),
    )
    .await
    .unwrap();
    assert!(coordinator.is_done());
    assert_eq!(summary.maps, 3);
    assert_eq!(summary.reduces, n_reduce);

    // el rezagado termina tarde: su reporte no cambia nada
    let late = execute_task(&storage, &Application::wordcount(), &stuck).unwrap();
    assert!(!coordinator.report_completion(&late));
    assert!(coordinator.is_done());
    assert_eq!(collect_outputs(&storage, n_reduce), expected_counts());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn workers_over_http() {
    let tmp = temp_dir("http");
    let inputs = write_inputs(&tmp);
    let n_reduce = 2;
    let coordinator = Coordinator::new(inputs, n_reduce);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(coordinator.clone());
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let storage = Arc::new(LocalStorage::new(tmp.join("work")).unwrap());
    let handles: Vec<_> = (0..2)
        .map(|w| {
            let rpc = HttpCoordinatorClient::new(
                format!("http://{}", addr),
                format!("http-{}", w),
                RetryPolicy::default(),
            );
            let storage = storage.clone();
            tokio::spawn(async move {
                run_worker(&rpc, storage, Application::wordcount(), Duration::from_millis(5)).await
            })
        })
        .collect();

    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert!(coordinator.is_done());
    assert_eq!(collect_outputs(&storage, n_reduce), expected_counts());
    server.abort();
}

#[tokio::test]
async fn unreachable_master_stops_worker_after_retries() {
    let tmp = temp_dir("unreachable");

    // puerto libre: se abre y se cierra enseguida
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let rpc = HttpCoordinatorClient::new(
        format!("http://{}", addr),
        "solo",
        RetryPolicy {
            max_retries: 2,
            backoff: Duration::from_millis(1),
        },
    );
    let res = run_worker(
        &rpc,
        Arc::new(LocalStorage::new(&tmp).unwrap()),
        Application::wordcount(),
        Duration::from_millis(1),
    )
    .await;

    let err = res.unwrap_err();
    assert!(format!("{:#}", err).contains("tras 2 reintentos"));
}
