use std::path::Path;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::output;

const COMPOSE_TEMPLATE: &str = r#"services:
  redis-primary:
    image: ${REDIS_IMAGE:-rdo-redis}:latest
    container_name: rdo-redis-primary
    command:
      - redis-server
      - --requirepass
      - ${REDIS_PASSWORD}
      - --maxmemory
      - ${REDIS_MAXMEMORY:-256mb}
      - --maxmemory-policy
      - ${REDIS_MAXMEMORY_POLICY:-allkeys-lru}
    ports:
      - "${REDIS_PORT:-6379}:6379"
    volumes:
      - redis-data:/data
    labels:
      orchestrator.role: primary

  redis-replica-1:
    image: ${REDIS_IMAGE:-rdo-redis}:latest
    container_name: rdo-redis-replica-1
    command:
      - redis-server
      - --replicaof
      - redis-primary
      - "6379"
      - --masterauth
      - ${REDIS_PASSWORD}
      - --requirepass
      - ${REDIS_PASSWORD}
    depends_on:
      - redis-primary
    labels:
      orchestrator.role: replica

  redis-replica-2:
    image: ${REDIS_IMAGE:-rdo-redis}:latest
    container_name: rdo-redis-replica-2
    command:
      - redis-server
      - --replicaof
      - redis-primary
      - "6379"
      - --masterauth
      - ${REDIS_PASSWORD}
      - --requirepass
      - ${REDIS_PASSWORD}
    depends_on:
      - redis-primary
    labels:
      orchestrator.role: replica

  sentinel-1:
    image: ${REDIS_IMAGE:-rdo-redis}:latest
    container_name: rdo-sentinel-1
    profiles: ["sentinel"]
    command:
      - redis-sentinel
      - /etc/redis/sentinel.conf
    volumes:
      - ./sentinel.conf:/etc/redis/sentinel.conf
    depends_on:
      - redis-primary
    labels:
      orchestrator.role: sentinel

  redis-exporter:
    image: oliver006/redis_exporter:latest
    container_name: rdo-redis-exporter
    profiles: ["monitoring"]
    environment:
      REDIS_ADDR: redis://redis-primary:6379
      REDIS_PASSWORD: ${REDIS_PASSWORD}
    depends_on:
      - redis-primary
    labels:
      orchestrator.role: app

  haproxy:
    image: haproxy:2.9-alpine
    container_name: rdo-haproxy
    profiles: ["loadbalancer"]
    volumes:
      - ./haproxy.cfg:/usr/local/etc/haproxy/haproxy.cfg
    depends_on:
      - redis-primary
      - redis-replica-1
      - redis-replica-2
    labels:
      orchestrator.role: loadbalancer

volumes:
  redis-data:
"#;

const DOCKERFILE_TEMPLATE: &str = r#"FROM redis:7-alpine

ARG BUILD_TIMESTAMP=unknown
ARG SOURCE_REVISION=unknown
LABEL org.opencontainers.image.created=$BUILD_TIMESTAMP \
      org.opencontainers.image.revision=$SOURCE_REVISION
"#;

/// Default quorum written to both `.env` and the scaffolded sentinel
/// configuration; the two must agree or sentinel failover behaves
/// differently from what validation accepted.
const DEFAULT_SENTINEL_QUORUM: u32 = 2;

fn sentinel_conf(quorum: u32) -> String {
    format!(
        "port 26379\n\
         sentinel monitor rdo-primary redis-primary 6379 {quorum}\n\
         sentinel down-after-milliseconds rdo-primary 5000\n\
         sentinel failover-timeout rdo-primary 60000\n\
         sentinel parallel-syncs rdo-primary 1\n"
    )
}

const HAPROXY_TEMPLATE: &str = r#"defaults
    mode tcp
    timeout connect 4s
    timeout client 30s
    timeout server 30s

frontend redis_read
    bind *:6380
    default_backend redis_replicas

backend redis_replicas
    balance roundrobin
    server replica1 redis-replica-1:6379 check
    server replica2 redis-replica-2:6379 check
"#;

pub fn run() -> anyhow::Result<()> {
    if Path::new(".env").exists() {
        anyhow::bail!("already initialized; refusing to overwrite .env");
    }

    let password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    let env_file = format!(
        "REDIS_PASSWORD={password}\n\
         REDIS_PORT=6379\n\
         REDIS_MAXMEMORY=256mb\n\
         REDIS_MAXMEMORY_POLICY=allkeys-lru\n\
         REDIS_IMAGE=rdo-redis\n\
         REDIS_REPLICA_COUNT=2\n\
         SENTINEL_QUORUM={DEFAULT_SENTINEL_QUORUM}\n"
    );
    std::fs::write(".env", env_file)?;
    output::success(".env written");
    output::info("a password was generated and stored in .env; it will not be shown again");

    write_if_absent("docker-compose.yml", COMPOSE_TEMPLATE)?;
    write_if_absent("Dockerfile", DOCKERFILE_TEMPLATE)?;
    write_if_absent("sentinel.conf", &sentinel_conf(DEFAULT_SENTINEL_QUORUM))?;
    write_if_absent("haproxy.cfg", HAPROXY_TEMPLATE)?;

    output::success("initialized; run 'rdo validate' then 'rdo deploy'");
    Ok(())
}

fn write_if_absent(path: &str, contents: &str) -> anyhow::Result<()> {
    if Path::new(path).exists() {
        output::warning(&format!("{path} already exists, leaving it untouched"));
        return Ok(());
    }
    std::fs::write(path, contents)?;
    output::success(&format!("{path} written"));
    Ok(())
}
