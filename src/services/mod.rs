/*
 * Responsibility
 * - auth: gateway trust decision and the digest it relies on
 * - storage: object store client + storage service
 */
pub mod auth;
pub mod storage;
